use scraper::{ElementRef, Selector};

/// The slice of DOM querying the card classifier relies on.
///
/// Kept narrow so classification never depends on a particular HTML
/// library's types.
pub trait Fragment: Sized {
    /// First descendant `<tag class="... class ...">`.
    fn find(&self, tag: &str, class: &str) -> Option<Self>;

    /// All descendants with the given tag, in document order.
    fn find_all(&self, tag: &str) -> Vec<Self>;

    /// Text content with every text node trimmed and blank nodes dropped.
    fn text(&self) -> String;
}

impl<'a> Fragment for ElementRef<'a> {
    fn find(&self, tag: &str, class: &str) -> Option<Self> {
        let selector = Selector::parse(&format!("{}.{}", tag, class)).ok()?;
        self.select(&selector).next()
    }

    fn find_all(&self, tag: &str) -> Vec<Self> {
        match Selector::parse(tag) {
            Ok(selector) => self.select(&selector).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn text(&self) -> String {
        ElementRef::text(self)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn root(doc: &Html) -> ElementRef<'_> {
        doc.root_element()
    }

    #[test]
    fn test_find_matches_any_class_in_list() {
        let doc = Html::parse_fragment(
            r#"<div class="card match__md_card--status big">  Encerrado </div>"#,
        );
        let el = root(&doc).find("div", "match__md_card--status").unwrap();
        assert_eq!(Fragment::text(&el), "Encerrado");
    }

    #[test]
    fn test_find_requires_tag() {
        let doc = Html::parse_fragment(r#"<span class="match__md_card--live">AO VIVO</span>"#);
        assert!(root(&doc).find("div", "match__md_card--live").is_none());
    }

    #[test]
    fn test_text_strips_each_node() {
        let doc = Html::parse_fragment("<div class=\"x\">\n  <b> 2 </b>\n  x\n  <b>1</b>\n</div>");
        let el = root(&doc).find("div", "x").unwrap();
        assert_eq!(Fragment::text(&el), "2x1");
        let bold: Vec<String> = el.find_all("b").iter().map(Fragment::text).collect();
        assert_eq!(bold, vec!["2", "1"]);
    }
}
