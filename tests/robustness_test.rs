use rs_pull::dom::{Document, NodeId, NodeKind};
use rs_pull::{pull, Options};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Every node is reachable from the root exactly once, and parent links agree.
fn assert_well_formed(doc: &Document) {
    let mut seen = HashSet::new();
    let mut stack = vec![doc.root()];
    while let Some(id) = stack.pop() {
        assert!(seen.insert(id), "node {id:?} reached twice");
        let node = doc.node(id);
        for &child in node.children().iter().chain(node.attributes()) {
            assert_eq!(doc.node(child).parent(), Some(id));
            stack.push(child);
        }
    }
    assert_eq!(seen.len(), doc.len(), "unreachable nodes in document");
}

const MALFORMED: &[&str] = &[
    "",
    "   ",
    "plain text, no markup",
    "<p>text<div>more",
    "<p><div></p></div>",
    "<html><body><article>content",
    "<div class=\"test id=broken>",
    "&amp text &lt;",
    "<<<>>>",
    "</div></p></body>",
    "<b><i>crossed</b></i>",
    "<table><tr><td>a<tr><td>b",
    "<!-- never closed",
    "<script>if (a < b) { x() }</script><p>after</p>",
    "<svg><g><text>vector</text></g></svg>",
    "<?xml version=\"1.0\"?><!DOCTYPE html><p>x</p>",
    "\0\u{8}<p>\0</p>",
];

#[test]
fn malformed_inputs_produce_well_formed_trees() {
    for html in MALFORMED {
        let doc = Document::parse(html);
        assert_well_formed(&doc);
        assert_eq!(doc.node(doc.root()).kind(), NodeKind::Document);
    }
}

#[test]
fn malformed_inputs_never_fail_the_pipeline() {
    for html in MALFORMED {
        for query in ["//*", "//text()", "//@*", "//comment()", "//p"] {
            let result = pull(html, &Options::new(query));
            assert!(result.is_ok(), "{html:?} {query}: {result:?}");
        }
    }
}

#[test]
fn content_survives_unclosed_tags() {
    let result = pull("<p>text<div>more", &Options::new("//body")).expect("pipeline should succeed");
    assert_eq!(result.lines, ["textmore"]);
}

#[test]
fn crossed_tags_keep_their_text() {
    let result = pull("<b><i>crossed</b> tail</i>", &Options::new("//b")).expect("pipeline should succeed");
    assert_eq!(result.lines, ["crossed"]);
}

#[test]
fn element_and_attribute_names_are_lowercase() {
    let doc = Document::parse("<HTML><BODY><DIV CLASS='A' Data-X='1'><Span>x</Span></DIV></BODY></HTML>");
    for (_, node) in doc.iter() {
        if let Some(name) = node.name() {
            assert_eq!(name, name.to_ascii_lowercase());
        }
    }
    // Values keep their case.
    let result = pull(
        "<DIV CLASS='A'>x</DIV>",
        &Options::new("//div/@class"),
    )
    .expect("pipeline should succeed");
    assert_eq!(result.lines, ["A"]);
}

#[test]
fn empty_document_has_implied_structure() {
    let doc = Document::parse("");
    let names: Vec<_> = doc.iter().filter_map(|(_, n)| n.name()).collect();
    assert_eq!(names, ["html", "head", "body"]);
    let result = pull("", &Options::new("//body")).expect("pipeline should succeed");
    assert!(result.is_empty());
    assert_eq!(result.matched, 1);
}

#[test]
fn node_ids_are_dense() {
    let doc = Document::parse("<div a='1' b='2'><p>x<!--c--></p></div>");
    let ids: Vec<NodeId> = doc.iter().map(|(id, _)| id).collect();
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(id.index(), i);
    }
}

#[test]
fn deep_nesting_is_handled() {
    let html = "<div>".repeat(5_000) + "bottom" + &"</div>".repeat(5_000);
    let doc = Document::parse(&html);
    assert_well_formed(&doc);
    let result = pull(&html, &Options::new("//div[not(div)]")).expect("pipeline should succeed");
    assert_eq!(result.lines, ["bottom"]);
}

#[test]
fn large_flat_document_completes_quickly() {
    let html = "<li>item</li>".repeat(20_000);
    let start = Instant::now();
    let result = pull(&html, &Options::new("//li").with_rule("item", "x")).expect("pipeline should succeed");
    assert_eq!(result.len(), 20_000);
    assert!(start.elapsed() < Duration::from_secs(30));
}
