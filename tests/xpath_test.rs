use rs_pull::dom::{Document, NodeId};
use rs_pull::xpath::Query;
use rs_pull::Error;

const SHOP: &str = r#"<html><head><title>Shop</title></head><body>
<div id="main" class="content">
  <h1>Products</h1>
  <ul class="items">
    <li class="item" data-price="3">Apple</li>
    <li class="item sale" data-price="1">Banana</li>
    <li class="item" data-price="7">Cherry</li>
  </ul>
  <!-- footer note -->
  <p>First <b>bold</b> paragraph.</p>
  <p>Second paragraph.</p>
</div>
<div id="side"><a href="/a">A</a><a href="/b">B</a></div>
</body></html>"#;

fn select(doc: &Document, query: &str) -> Vec<NodeId> {
    Query::parse(query)
        .and_then(|q| q.select(doc))
        .unwrap_or_else(|e| panic!("{query}: {e}"))
}

fn texts(query: &str) -> Vec<String> {
    let doc = Document::parse(SHOP);
    select(&doc, query)
        .into_iter()
        .map(|id| doc.string_value(id))
        .collect()
}

fn names(query: &str) -> Vec<String> {
    let doc = Document::parse(SHOP);
    select(&doc, query)
        .into_iter()
        .map(|id| doc.node(id).name().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn descendant_elements_in_document_order() {
    assert_eq!(texts("//li"), ["Apple", "Banana", "Cherry"]);
}

#[test]
fn absolute_child_path() {
    assert_eq!(names("/html/body/div"), ["div", "div"]);
    assert_eq!(texts("/html/head/title"), ["Shop"]);
}

#[test]
fn positional_predicates() {
    assert_eq!(texts("//li[2]"), ["Banana"]);
    assert_eq!(texts("//li[last()]"), ["Cherry"]);
    assert_eq!(texts("//li[position() > 1]"), ["Banana", "Cherry"]);
    assert_eq!(texts("//div[@id='main']/p[1]"), ["First bold paragraph."]);
}

#[test]
fn positions_are_per_parent_unless_parenthesized() {
    let doc = Document::parse("<ul><li>a</li><li>b</li></ul><ul><li>c</li></ul>");
    let text = |q: &str| -> Vec<String> {
        select(&doc, q)
            .into_iter()
            .map(|id| doc.string_value(id))
            .collect()
    };
    assert_eq!(text("//li[1]"), ["a", "c"]);
    assert_eq!(text("(//li)[1]"), ["a"]);
    assert_eq!(text("(//li)[last()]"), ["c"]);
}

#[test]
fn attribute_predicates() {
    assert_eq!(texts("//li[@data-price > 2]"), ["Apple", "Cherry"]);
    assert_eq!(texts("//li[contains(@class, 'sale')]"), ["Banana"]);
    assert_eq!(texts("//li[not(@class='item')]"), ["Banana"]);
    assert_eq!(
        texts("//li[@data-price='1' or @data-price='7']"),
        ["Banana", "Cherry"]
    );
    assert_eq!(texts("//li[@class='item' and @data-price<5]"), ["Apple"]);
    assert_eq!(names("//*[@id]"), ["div", "div"]);
}

#[test]
fn attribute_nodes() {
    assert_eq!(texts("//li/@data-price"), ["3", "1", "7"]);
    assert_eq!(texts("//div/@*"), ["main", "content", "side"]);
    assert_eq!(names("//a/@href"), ["href", "href"]);
}

#[test]
fn string_functions() {
    assert_eq!(texts("//li[starts-with(., 'B')]"), ["Banana"]);
    assert_eq!(texts("//li[normalize-space(.)='Cherry']"), ["Cherry"]);
    assert_eq!(texts("//a[string-length(@href)=2]"), ["A", "B"]);
    assert_eq!(texts("//*[name()='h1']"), ["Products"]);
    assert_eq!(texts("//a[concat(@href, '!') = '/b!']"), ["B"]);
    assert_eq!(names("//ul[count(li) = 3]"), ["ul"]);
}

#[test]
fn union_is_in_document_order() {
    assert_eq!(texts("//a/@href | //h1"), ["Products", "/a", "/b"]);
    assert_eq!(texts("//h1 | //h1"), ["Products"]);
}

#[test]
fn reverse_and_sibling_axes() {
    assert_eq!(texts("//p/b/.."), ["First bold paragraph."]);
    assert_eq!(texts("//b/ancestor::div/@id"), ["main"]);
    assert_eq!(names("//h1/following-sibling::*"), ["ul", "p", "p"]);
    assert_eq!(names("//h1/following-sibling::*[1]"), ["ul"]);
    assert_eq!(
        texts("//p[2]/preceding-sibling::*[1]"),
        ["First bold paragraph."]
    );
    assert_eq!(names("//b/ancestor-or-self::*[1]"), ["b"]);
    assert_eq!(names("//li[1]/self::li"), ["li"]);
}

#[test]
fn text_and_comment_nodes() {
    assert_eq!(
        texts("//p/text()"),
        ["First ", " paragraph.", "Second paragraph."]
    );
    assert_eq!(texts("//div[@id='main']/comment()"), [" footer note "]);
}

#[test]
fn filter_expression_with_path_tail() {
    assert_eq!(texts("(//div)[2]//a"), ["A", "B"]);
    assert_eq!(texts("(//div)//a/@href"), ["/a", "/b"]);
}

#[test]
fn relative_query_starts_at_document() {
    assert_eq!(names("html"), ["html"]);
    assert_eq!(names("descendant::ul"), ["ul"]);
}

#[test]
fn arithmetic_in_predicates() {
    assert_eq!(texts("//li[last()-1]"), ["Banana"]);
    assert_eq!(texts("//li[position() mod 2 = 1]"), ["Apple", "Cherry"]);
    assert_eq!(texts("//li[position() = 1 + 1]"), ["Banana"]);
    assert_eq!(texts("//li[@data-price * 2 > 10]"), ["Cherry"]);
    assert_eq!(texts("//li[@data-price div 2 < 1]"), ["Banana"]);
    assert_eq!(texts("//li[-@data-price < -2]"), ["Apple", "Cherry"]);
    assert_eq!(texts("//li[-1 < position() - 2]"), ["Banana", "Cherry"]);
}

#[test]
fn following_and_preceding_axes() {
    assert_eq!(texts("//h1/following::li[1]"), ["Apple"]);
    assert_eq!(texts("//ul/following::p"), ["First bold paragraph.", "Second paragraph."]);
    assert_eq!(texts("//a[1]/preceding::li"), ["Apple", "Banana", "Cherry"]);
    assert_eq!(texts("//a[1]/preceding::li[1]"), ["Cherry"]);
    // Ancestors are not preceding nodes.
    assert!(names("//b/preceding::div").is_empty());
}

#[test]
fn processing_instruction_and_namespace_tests_select_nothing() {
    assert!(texts("//processing-instruction()").is_empty());
    assert!(texts("//processing-instruction('xml-stylesheet')").is_empty());
    assert!(texts("//div/namespace::*").is_empty());
    assert_eq!(texts("//h1[namespace-uri()='']"), ["Products"]);
}

#[test]
fn substring_functions() {
    assert_eq!(texts("//a[substring(@href, 1, 2)='/b']"), ["B"]);
    assert_eq!(texts("//li[substring(., 2)='anana']"), ["Banana"]);
    assert_eq!(texts("//li[substring-after(@class, 'item ')='sale']"), ["Banana"]);
    assert_eq!(texts("//li[substring-before(@class, ' ')='item']"), ["Banana"]);
}

#[test]
fn translate_folds_case() {
    assert_eq!(
        texts("//*[translate(name(), 'abcdefghijklmnopqrstuvwxyz', 'ABCDEFGHIJKLMNOPQRSTUVWXYZ')='H1']"),
        ["Products"]
    );
    assert_eq!(texts("//li[contains(translate(., 'ABC', 'abc'), 'apple')]"), ["Apple"]);
}

#[test]
fn number_functions() {
    assert_eq!(texts("//li[number(@data-price) = 7]"), ["Cherry"]);
    assert_eq!(names("//ul[sum(li/@data-price) = 11]"), ["ul"]);
    assert_eq!(texts("//li[floor(@data-price div 2) = 1]"), ["Apple"]);
    assert_eq!(texts("//li[ceiling(@data-price div 2) = 1]"), ["Banana"]);
    assert_eq!(texts("//li[round(@data-price div 2) = 4]"), ["Cherry"]);
}

#[test]
fn boolean_function() {
    assert_eq!(texts("//li[boolean(@data-price)]"), ["Apple", "Banana", "Cherry"]);
    assert!(texts("//li[boolean(@missing)]").is_empty());
}

#[test]
fn id_function() {
    assert_eq!(texts("id('side')/a"), ["A", "B"]);
    assert_eq!(names("id('main side')"), ["div", "div"]);
    assert_eq!(names("id(//a[2]/../@id)"), ["div"]);
}

#[test]
fn lang_function() {
    let doc = Document::parse(r#"<html lang="en-GB"><body><p>a</p><p lang="fr">b</p></body></html>"#);
    let text = |q: &str| -> Vec<String> {
        select(&doc, q)
            .into_iter()
            .map(|id| doc.string_value(id))
            .collect()
    };
    assert_eq!(text("//p[lang('en')]"), ["a"]);
    assert_eq!(text("//p[lang('FR')]"), ["b"]);
    assert!(text("//p[lang('de')]").is_empty());
}

#[test]
fn names_are_case_sensitive() {
    assert!(texts("//LI").is_empty());
}

#[test]
fn no_match_is_empty() {
    assert!(texts("//table").is_empty());
    assert!(texts("//li[@data-price > 100]").is_empty());
}

#[test]
fn repeated_selection_is_identical() {
    let doc = Document::parse(SHOP);
    let query = Query::parse("//li | //a/@href | //p/text()").unwrap();
    let first = query.select(&doc).unwrap();
    let second = query.select(&doc).unwrap();
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn malformed_queries_are_reported() {
    for query in ["//li[", "//li]", "///", "//@", "li[@class=]", "//li[unknown()]", "child:li", "//li[$price]"] {
        match Query::parse(query) {
            Err(Error::MalformedQuery { query: q, message }) => {
                assert_eq!(q, query);
                assert!(message.contains("offset"), "{query}: {message}");
            }
            other => panic!("{query}: expected MalformedQuery, got {other:?}"),
        }
    }
}

#[test]
fn non_node_set_results_are_reported() {
    let doc = Document::parse(SHOP);
    for query in ["count(//li)", "'text'", "//li = 'Apple'", "1 + 1"] {
        let result = Query::parse(query).and_then(|q| q.select(&doc));
        assert!(
            matches!(result, Err(Error::MalformedQuery { .. })),
            "{query}: {result:?}"
        );
    }
}

#[test]
fn predicate_on_non_node_set_is_reported() {
    let doc = Document::parse(SHOP);
    let result = Query::parse("('a')[1]").and_then(|q| q.select(&doc));
    assert!(matches!(result, Err(Error::MalformedQuery { .. })));
}
