use entrypack_bundle::{
    BundleError, CallgraphSlice, ContextAssembler, ContextConfig, FsBundleWriter, TypeCollector, TRUNCATION_MARKER,
};
use entrypack_corpus::{ClassRef, Corpus, CorpusSnapshot, MethodRef, SourceCorpus};
use entrypack_scan::{EntryPoint, Provenance};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const SERVICE_PATH: &str = "/repo/src/main/java/com/example/service/OrderService.java";
const MAPPER_PATH: &str = "/repo/src/main/java/com/example/mapper/OrderMapper.java";
const MAPPER_XML_PATH: &str = "/repo/src/main/resources/mapper/OrderMapper.xml";

const ORDER_SERVICE: &str = r#"package com.example.service;

import com.example.dto.OrderDto;
import com.example.dto.OrderQuery;
import com.example.mapper.OrderMapper;
import org.springframework.stereotype.Service;

@Service
public class OrderService {
    private OrderMapper orderMapper;

    public OrderDto findOrder(OrderQuery query) {
        validate(query);
        return orderMapper.findByQuery(query);
    }

    private void validate(OrderQuery query) {
        if (query == null) {
            throw new IllegalArgumentException("query");
        }
    }
}
"#;

const ORDER_MAPPER: &str = r"package com.example.mapper;

import com.baomidou.mybatisplus.core.mapper.BaseMapper;
import com.example.dto.OrderQuery;
import com.example.entity.OrderEntity;

public interface OrderMapper extends BaseMapper<OrderEntity> {
    OrderEntity findByQuery(OrderQuery query);
}
";

const ORDER_MAPPER_XML: &str = r#"<mapper namespace="com.example.mapper.OrderMapper">
  <resultMap id="itemMap" type="com.example.entity.OrderItem"/>
  <select id="findByQuery" resultType="OrderEntity">
    SELECT * FROM orders WHERE no = #{query.no}
  </select>
</mapper>
"#;

const FIND_BY_QUERY_SQL: &str = "SELECT * FROM orders WHERE no = #{query.no}";

fn corpus() -> CorpusSnapshot {
    CorpusSnapshot::from_sources([
        (SERVICE_PATH, ORDER_SERVICE),
        (MAPPER_PATH, ORDER_MAPPER),
        (MAPPER_XML_PATH, ORDER_MAPPER_XML),
        (
            "/repo/src/main/java/com/example/dto/OrderDto.java",
            "package com.example.dto;\n\npublic class OrderDto {\n    private Long id;\n    private OrderStatus status;\n}\n",
        ),
        (
            "/repo/src/main/java/com/example/dto/OrderQuery.java",
            "package com.example.dto;\n\npublic class OrderQuery {\n    private String no;\n}\n",
        ),
        (
            "/repo/src/main/java/com/example/dto/OrderStatus.java",
            "package com.example.dto;\n\npublic enum OrderStatus {\n    NEW,\n    PAID\n}\n",
        ),
        (
            "/repo/src/main/java/com/example/entity/OrderEntity.java",
            "package com.example.entity;\n\n@TableName(\"orders\")\npublic class OrderEntity {\n    private Long id;\n}\n",
        ),
        (
            "/repo/src/main/java/com/example/entity/OrderItem.java",
            "package com.example.entity;\n\npublic class OrderItem {\n    private Long orderId;\n}\n",
        ),
    ])
    .expect("corpus")
}

fn service_entry() -> EntryPoint {
    EntryPoint {
        class_fqn: "com.example.service.OrderService".into(),
        method: "findOrder(OrderQuery)".into(),
        file: PathBuf::from(SERVICE_PATH),
        line: 12,
        provenance: Provenance::Annotation("Service".into()),
        sql: None,
        xml_path: None,
    }
}

fn xml_entry() -> EntryPoint {
    EntryPoint {
        class_fqn: "com.example.mapper.OrderMapper".into(),
        method: "findByQuery(OrderQuery)".into(),
        file: PathBuf::from(MAPPER_XML_PATH),
        line: 3,
        provenance: Provenance::MyBatisXml,
        sql: Some(FIND_BY_QUERY_SQL.into()),
        xml_path: Some(PathBuf::from(MAPPER_XML_PATH)),
    }
}

fn base_mapper_entry() -> EntryPoint {
    EntryPoint {
        class_fqn: "com.example.mapper.OrderMapper".into(),
        method: "insert(OrderEntity)".into(),
        file: PathBuf::from(MAPPER_PATH),
        line: 7,
        provenance: Provenance::BaseMapper,
        sql: None,
        xml_path: None,
    }
}

fn slice() -> CallgraphSlice {
    CallgraphSlice::new("OrderService.findOrder -> OrderService.validate -> OrderMapper.findByQuery")
        .with_anchor(SERVICE_PATH, 17, 21)
        .with_anchor(SERVICE_PATH, 17, 21)
        .with_anchor(SERVICE_PATH, 20, 400)
        .with_anchor("/repo/src/main/java/com/example/Gone.java", 1, 5)
}

fn assembler(max_chars: usize) -> ContextAssembler {
    let config = ContextConfig {
        max_chars,
        ..ContextConfig::default()
    };
    ContextAssembler::new(config, FsBundleWriter::new("unused")).expect("assembler")
}

fn position(text: &str, needle: &str) -> usize {
    text.find(needle)
        .unwrap_or_else(|| panic!("missing {needle:?} in:\n{text}"))
}

#[test]
fn renders_sections_in_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let corpus = corpus();
    let text = assembler(1_000_000).render(&corpus, &service_entry(), &slice());

    assert!(text.starts_with("# Entry Method\ncom.example.service.OrderService#findOrder(OrderQuery)\n"));
    assert!(!text.contains("# SQL Statement"));

    let sections = [
        "# Method Source",
        "# Callgraph Summary",
        "# Slices",
        "# Related Types (DTO/VO/Entity/Enum)",
        "# Called Methods",
    ];
    let positions: Vec<usize> = sections.iter().map(|s| position(&text, s)).collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);

    assert!(text.contains("    12 |     public OrderDto findOrder(OrderQuery query) {\n"));
    assert!(text.contains("    15 |     }\n"));
    assert!(text.contains("# Callgraph Summary\nOrderService.findOrder -> OrderService.validate"));

    let anchor = format!("## File: {SERVICE_PATH} [17-21]\n");
    assert_eq!(text.matches(&anchor).count(), 1);
    // 22 lines plus the empty line after the trailing newline
    assert!(text.contains(&format!("## File: {SERVICE_PATH} [20-23]\n")));
    assert!(!text.contains("Gone.java"));

    for related in ["com.example.dto.OrderQuery", "com.example.dto.OrderDto", "com.example.dto.OrderStatus"] {
        assert_eq!(text.matches(&format!("## {related}\n")).count(), 1, "{related}");
    }
    assert!(!text.contains("## com.example.mapper.OrderMapper\n"));

    assert!(text.contains("## com.example.service.OrderService#validate\n"));
    assert!(text.contains("## com.example.mapper.OrderMapper#findByQuery\n"));
}

#[test]
fn xml_entries_carry_sql_and_result_types() {
    let corpus = corpus();
    let text = assembler(1_000_000).render(&corpus, &xml_entry(), &CallgraphSlice::new("findByQuery"));

    let sql_block = format!("# SQL Statement\n```sql\n{FIND_BY_QUERY_SQL}\n```\n// Origin: {MAPPER_XML_PATH}\n");
    assert!(text.contains(&sql_block), "{text}");
    assert!(position(&text, "# SQL Statement") < position(&text, "# Method Source"));
    assert!(text.contains("OrderEntity findByQuery(OrderQuery query);"));

    for related in [
        "com.example.dto.OrderQuery",
        "com.example.entity.OrderEntity",
        "com.example.entity.OrderItem",
    ] {
        assert_eq!(text.matches(&format!("## {related}\n")).count(), 1, "{related}");
    }
}

#[test]
fn base_mapper_entries_relate_the_generic_entity() {
    let corpus = corpus();
    let text = assembler(1_000_000).render(&corpus, &base_mapper_entry(), &CallgraphSlice::default());

    assert!(text.starts_with("# Entry Method\ncom.example.mapper.OrderMapper#insert(OrderEntity)\n"));
    assert!(!text.contains("# Method Source"));
    assert!(!text.contains("# Called Methods"));
    assert!(text.contains("## com.example.entity.OrderEntity\n"));
    assert!(text.contains("@TableName(\"orders\")"));
    assert!(!text.contains("## com.example.entity.OrderItem\n"));
}

#[test]
fn budget_truncates_only_at_the_tail() {
    let corpus = corpus();
    let full = assembler(1_000_000).render(&corpus, &service_entry(), &slice());
    let full_chars = full.chars().count();
    let marker_chars = TRUNCATION_MARKER.chars().count();

    for budget in [1, 40, 250, full_chars / 2, full_chars - 1] {
        let text = assembler(budget).render(&corpus, &service_entry(), &slice());
        assert!(text.chars().count() <= budget + marker_chars, "budget {budget}");

        let body = text
            .strip_suffix(TRUNCATION_MARKER)
            .unwrap_or_else(|| panic!("budget {budget} not marked"));
        assert_eq!(body.chars().count(), budget);
        assert!(full.starts_with(body), "budget {budget}");
    }

    assert_eq!(assembler(full_chars).render(&corpus, &service_entry(), &slice()), full);
}

#[test]
fn class_bundles_list_public_methods() {
    let corpus = corpus();
    let text = assembler(1_000_000).render_for_class(&corpus, &service_entry());

    assert!(text.starts_with("# Entry Class\ncom.example.service.OrderService\n\n# Class Source\n"));
    assert!(text.contains(&format!("// File: {SERVICE_PATH} [")));
    assert!(text.contains("# Public Methods\n- findOrder(OrderQuery)\n"));
    assert!(!text.contains("- validate("));
    assert!(text.contains("## com.example.dto.OrderDto\n"));

    let mut missing = service_entry();
    missing.class_fqn = "com.example.service.Missing".into();
    assert_eq!(
        assembler(1_000_000).render_for_class(&corpus, &missing),
        "# Entry Class\ncom.example.service.Missing\n\n"
    );
}

struct NoTypes;

impl TypeCollector for NoTypes {
    fn collect(&self, _corpus: &dyn SourceCorpus, _method: &MethodRef, _max_depth: usize) -> Vec<ClassRef> {
        Vec::new()
    }
}

#[test]
fn collectors_are_pluggable() {
    let corpus = corpus();
    let config = ContextConfig {
        collect_called: false,
        ..ContextConfig::default()
    };
    let assembler = ContextAssembler::new(config, FsBundleWriter::new("unused"))
        .unwrap()
        .with_type_collector(NoTypes);

    let text = assembler.render(&corpus, &service_entry(), &CallgraphSlice::default());
    assert!(!text.contains("# Related Types"));
    assert!(!text.contains("# Called Methods"));
}

#[test]
fn builds_bundles_to_disk() {
    let temp = tempdir().unwrap();
    let corpus = Corpus::from_snapshot(corpus());
    let assembler = ContextAssembler::new(ContextConfig::default(), FsBundleWriter::new(temp.path())).unwrap();

    let bundle = assembler
        .build(
            &corpus,
            &service_entry(),
            &slice(),
            Path::new("bundles/com.example.service.OrderService/findOrder.txt"),
        )
        .unwrap();
    assert!(bundle.path.is_absolute());
    assert!(bundle.path.ends_with("bundles/com.example.service.OrderService/findOrder.txt"));
    assert_eq!(std::fs::read_to_string(&bundle.path).unwrap(), bundle.text);

    let class_bundle = assembler
        .build_for_class(&corpus, &service_entry(), Path::new("bundles/OrderService.txt"))
        .unwrap();
    assert!(class_bundle.text.starts_with("# Entry Class\n"));
    assert_eq!(std::fs::read_to_string(&class_bundle.path).unwrap(), class_bundle.text);

    let escaped = assembler.build(&corpus, &service_entry(), &slice(), Path::new("../outside.txt"));
    assert!(matches!(escaped, Err(BundleError::InvalidPath(_))));
}

#[test]
fn rejects_zero_budget() {
    let config = ContextConfig {
        max_chars: 0,
        ..ContextConfig::default()
    };
    let result = ContextAssembler::new(config, FsBundleWriter::new("unused"));
    assert!(matches!(result, Err(BundleError::InvalidConfig(_))));
}
