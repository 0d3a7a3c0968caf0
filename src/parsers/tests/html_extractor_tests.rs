use crate::config::{ExtractConfig, ThumbnailRewrite};
use crate::parsers::Extractor;
use crate::parsers::html::HtmlExtractor;
use url::Url;

#[cfg(test)]
mod basic_tests {
    use super::*;

    #[test]
    fn test_empty_document() {
        let extractor = HtmlExtractor::default();
        assert!(extractor.extract("").is_empty());
        assert!(extractor.extract("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_reads_data_src_alt_and_size() {
        let html = r#"
            <div class="imgbox">
                <img data-src="https://img.example.com/thumbnail/1.jpg" alt="韩立 剧照" width="400" height="200">
            </div>
        "#;
        let candidates = HtmlExtractor::default().extract(html);

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.url.as_str(), "https://img.example.com/large/1.jpg");
        assert_eq!(c.title, "韩立 剧照");
        assert_eq!((c.declared_width, c.declared_height), (400, 200));
    }

    #[test]
    fn test_missing_url_attribute_is_skipped() {
        let html = r#"
            <div class="imgbox"><img alt="no source"></div>
            <div class="imgbox"><span>no image at all</span></div>
            <div class="imgbox"><img data-src="https://img.example.com/2.jpg" alt="ok"></div>
        "#;
        let candidates = HtmlExtractor::default().extract(html);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "ok");
    }

    #[test]
    fn test_missing_size_defaults_to_zero() {
        let html = r#"<div class="imgbox"><img data-src="https://img.example.com/3.jpg"></div>"#;
        let candidates = HtmlExtractor::default().extract(html);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "");
        assert_eq!(candidates[0].declared_width, 0);
        assert_eq!(candidates[0].declared_height, 0);
        assert!(!candidates[0].has_declared_size());
    }

    #[test]
    fn test_non_numeric_size_is_skipped() {
        let html = r#"
            <div class="imgbox"><img data-src="https://img.example.com/4.jpg" width="auto" height="10"></div>
            <div class="imgbox"><img data-src="https://img.example.com/5.jpg" width="30" height="10"></div>
        "#;
        let candidates = HtmlExtractor::default().extract(html);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url.path(), "/5.jpg");
    }

    #[test]
    fn test_unparsable_url_is_skipped() {
        let html = r#"
            <div class="imgbox"><img data-src="http://[broken" alt="bad"></div>
            <div class="imgbox"><img data-src="data:image/gif;base64,R0lGOD" alt="inline"></div>
            <div class="imgbox"><img data-src="/relative.jpg" alt="relative"></div>
        "#;
        assert!(HtmlExtractor::default().extract(html).is_empty());
    }

    #[test]
    fn test_document_order_is_preserved() {
        let html = r#"
            <div class="imgbox"><img data-src="https://img.example.com/c.jpg" alt="c"></div>
            <div class="imgbox"><img data-src="https://img.example.com/a.jpg" alt="a"></div>
            <div class="imgbox"><img data-src="https://img.example.com/b.jpg" alt="b"></div>
        "#;
        let titles: Vec<_> = HtmlExtractor::default()
            .extract(html)
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }
}

#[cfg(test)]
mod option_tests {
    use super::*;

    #[test]
    fn test_url_attribute_fallback() {
        let html = r#"
            <div class="imgbox"><img src="https://img.example.com/src.jpg" alt="src only"></div>
            <div class="imgbox"><img data-src="" data-imgurl="https://img.example.com/alt.jpg" alt="imgurl"></div>
        "#;
        let candidates = HtmlExtractor::default().extract(html);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].url.path(), "/src.jpg");
        assert_eq!(candidates[1].url.path(), "/alt.jpg");
    }

    #[test]
    fn test_relative_urls_resolve_against_base() {
        let html = r#"<div class="imgbox"><img data-src="/img/thumbnail/9.png" alt="r"></div>"#;
        let base = Url::parse("https://example.com/search?q=x").unwrap();
        let candidates = HtmlExtractor::default().with_base_url(base).extract(html);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url.as_str(), "https://example.com/img/large/9.png");
    }

    #[test]
    fn test_custom_selectors_without_rewrite() {
        let config = ExtractConfig {
            container_selector: "li.result".to_string(),
            image_selector: "img.main".to_string(),
            url_attributes: vec!["data-full".to_string()],
            thumbnail_rewrite: None,
        };
        let html = r#"
            <ul>
                <li class="result">
                    <img class="icon" data-full="https://img.example.com/icon.png">
                    <img class="main" data-full="https://img.example.com/thumbnail.jpg" alt="main">
                </li>
                <li class="other"><img class="main" data-full="https://img.example.com/x.jpg"></li>
            </ul>
        "#;
        let candidates = HtmlExtractor::from_config(&config).extract(html);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url.as_str(), "https://img.example.com/thumbnail.jpg");
    }

    #[test]
    fn test_custom_rewrite_rule() {
        let config = ExtractConfig {
            thumbnail_rewrite: Some(ThumbnailRewrite {
                from: "_s.".to_string(),
                to: "_l.".to_string(),
            }),
            ..ExtractConfig::default()
        };
        let html = r#"<div class="imgbox"><img data-src="https://img.example.com/p_s.jpg"></div>"#;
        let candidates = HtmlExtractor::from_config(&config).extract(html);

        assert_eq!(candidates[0].url.path(), "/p_l.jpg");
    }

    #[test]
    fn test_invalid_selector_yields_nothing() {
        let config = ExtractConfig {
            container_selector: "div[".to_string(),
            ..ExtractConfig::default()
        };
        let html = r#"<div class="imgbox"><img data-src="https://img.example.com/1.jpg"></div>"#;
        assert!(HtmlExtractor::from_config(&config).extract(html).is_empty());
    }
}
