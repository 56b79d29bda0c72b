use mmldoc::{Language, MmlToHtml, RenderOptions};
use pretty_assertions::assert_eq;

#[test]
fn golden_snapshot_article_output() {
    let source = include_str!("golden/article.mml");

    let converter = MmlToHtml::new(RenderOptions::default());
    let rendered = converter
        .convert_str(source)
        .expect("failed to convert golden article");

    let expected = include_str!("golden/article_expected.html");
    assert_eq!(rendered.html.trim_end(), expected.trim_end());
}

#[test]
fn golden_snapshot_is_stable_across_runs() {
    let source = include_str!("golden/article.mml");
    let converter = MmlToHtml::with_defaults();
    let first = converter.convert_str(source).expect("first run");
    let second = converter.convert_str(source).expect("second run");
    assert_eq!(first.html, second.html);
    assert_eq!(first.toc, second.toc);
}

#[test]
fn golden_snapshot_korean_labels() {
    let source = include_str!("golden/article.mml");
    let options = RenderOptions {
        language: Language::Ko,
        ..Default::default()
    };
    let html = MmlToHtml::new(options)
        .convert_str(source)
        .expect("failed to convert golden article")
        .html;

    assert!(html.contains("<h2>목차</h2>"));
    assert!(html.contains("<h1 id=\"bibliography\">참고문헌</h1>"));
    assert!(html.contains("[온라인]. 이용 가능: "));
}
