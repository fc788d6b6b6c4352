use shelfscout_common::ProductRecord;
use shelfscout_extract::{Extractor, Strategies, StrategySpec, extract_products};

const ELECTRONICS: &str = include_str!("fixtures/html/electronics.html");
const CONSUMABLES: &str = include_str!("fixtures/html/consumables.html");
const WIRELESS_MOUSE: &str = include_str!("fixtures/html/wireless-mouse.html");
const NO_FRAGMENTS: &str = include_str!("fixtures/html/no-fragments.html");
const MALFORMED: &str = include_str!("fixtures/html/malformed.html");

fn record(title: &str, rating: f64, review_count: u64, image_url: &str) -> ProductRecord {
    ProductRecord {
        title: title.to_string(),
        rating,
        review_count,
        image_url: image_url.to_string(),
    }
}

fn assert_well_formed(records: &[ProductRecord]) {
    for r in records {
        assert!(!r.title.trim().is_empty(), "blank title in {r:?}");
        assert!(r.rating > 0.0, "non-positive rating in {r:?}");
        assert!(!r.image_url.is_empty(), "empty image in {r:?}");
        assert!(!r.image_url.starts_with("data:"), "inline image in {r:?}");
    }
}

#[test]
fn fixtures_extract_expected_records() {
    let cases: &[(&str, &str, Vec<ProductRecord>)] = &[
        (
            "electronics",
            ELECTRONICS,
            vec![
                record(
                    "Noise Cancelling Headphones",
                    4.6,
                    12_873,
                    "https://m.media-amazon.com/images/I/elec1.jpg",
                ),
                record(
                    "USB-C Charger",
                    3.9,
                    0,
                    "https://m.media-amazon.com/images/I/elec4.jpg",
                ),
            ],
        ),
        (
            "consumables",
            CONSUMABLES,
            vec![
                record(
                    "Organic Green Tea, 100 Count",
                    4.7,
                    2_045,
                    "https://m.media-amazon.com/images/I/cons1.jpg",
                ),
                record(
                    "Paper Towels, 12 Rolls",
                    4.8,
                    98_112,
                    "https://m.media-amazon.com/images/I/cons3.jpg",
                ),
            ],
        ),
        (
            "wireless-mouse",
            WIRELESS_MOUSE,
            vec![record("Acme Mouse", 4.5, 1_234, "https://img/x.jpg")],
        ),
        ("no-fragments", NO_FRAGMENTS, vec![]),
    ];

    for (name, html, expected) in cases {
        let got = extract_products(html);
        assert_eq!(&got, expected, "fixture {name}");
        assert_well_formed(&got);
    }
}

#[test]
fn specific_heading_wins_over_sponsored_label() {
    let got = extract_products(ELECTRONICS);
    assert!(got.iter().all(|r| r.title != "Sponsored"));
    assert_eq!(got[0].title, "Noise Cancelling Headphones");
}

#[test]
fn wireless_mouse_serializes_to_the_wire_shape() {
    let got = extract_products(WIRELESS_MOUSE);
    let json = serde_json::to_value(&got).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "title": "Acme Mouse",
            "rating": 4.5,
            "reviewCount": 1234,
            "imageUrl": "https://img/x.jpg"
        }])
    );
}

#[test]
fn markup_without_fragments_yields_nothing() {
    for html in ["", "<<<>>>", "plain text, no tags", NO_FRAGMENTS] {
        assert!(extract_products(html).is_empty(), "input {html:?}");
    }
}

#[test]
fn broken_markup_never_panics_and_keeps_invariants() {
    let got = extract_products(MALFORMED);
    assert_well_formed(&got);
}

#[test]
fn bad_fragment_does_not_stop_later_ones() {
    let html = format!(
        r#"<div data-asin="B0BAD">
             <h2><span>Broken Rating</span></h2>
             <span class="a-icon-alt">{} out of 5 stars</span>
             <img class="s-image" src="https://img/bad.jpg">
           </div>
           <div data-asin="B0GOOD">
             <h2><span>Good Lamp</span></h2>
             <span class="a-icon-alt">4.3 out of 5 stars</span>
             <img class="s-image" src="https://img/good.jpg">
           </div>"#,
        "9".repeat(400)
    );
    let got = extract_products(&html);
    assert_eq!(got, vec![record("Good Lamp", 4.3, 0, "https://img/good.jpg")]);
}

#[test]
fn blank_identity_is_not_a_fragment() {
    let html = r#"
        <div data-asin="   ">
          <h2><span>Ghost</span></h2>
          <span class="a-icon-alt">4.9 out of 5 stars</span>
          <img class="s-image" src="https://img/ghost.jpg">
        </div>"#;
    assert!(extract_products(html).is_empty());
}

#[test]
fn document_order_is_preserved() {
    let item = |id: &str, title: &str| {
        format!(
            r#"<div data-asin="{id}"><h2><span>{title}</span></h2>
               <span class="a-icon-alt">4.0 out of 5 stars</span>
               <img class="s-image" src="https://img/{id}.jpg"></div>"#
        )
    };
    let html = [item("A1", "First"), item("B2", "Second"), item("C3", "Third")].concat();
    let titles: Vec<String> = extract_products(&html)
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, ["First", "Second", "Third"]);
}

#[test]
fn custom_strategies_drive_extraction() {
    let strategies = Strategies {
        identity_attr: "data-sku".to_string(),
        title: vec![StrategySpec::attr("title-attr", "article", "data-title")],
        rating: vec![StrategySpec::text("score", ".score")],
        image: vec![StrategySpec::attr("thumb", "img.thumb", "src")],
        review_count: vec![StrategySpec::text("votes", ".votes")],
    };
    let extractor = Extractor::with_strategies(&strategies).unwrap();
    let html = r#"
        <section data-sku="S-1">
          <article data-title="Trail Shoes"></article>
          <b class="score">4.2</b>
          <img class="thumb" src="https://img/shoe.jpg">
          <i class="votes">(310)</i>
        </section>
        <section data-asin="B0IGNORED">
          <article data-title="Wrong Template"></article>
        </section>"#;

    assert_eq!(
        extractor.extract(html),
        vec![record("Trail Shoes", 4.2, 310, "https://img/shoe.jpg")]
    );
}

#[test]
fn shared_handles_point_at_the_default_extractor() {
    let a = shelfscout_extract::shared_extractor();
    let b = shelfscout_extract::shared_extractor();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
    assert!(std::ptr::eq(a.as_ref(), shelfscout_extract::default_extractor()));
}

#[test]
fn extractor_is_reusable_across_threads() {
    let extractor = shelfscout_extract::default_extractor();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| extractor.extract(WIRELESS_MOUSE)))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap().len(), 1);
        }
    });
}
