//! HTML parsing and in-place rewriting.
//!
//! Rendered post bodies are parsed as fragments into an arena [`Dom`],
//! rewritten by the post-processing passes, and serialized back.

pub mod dom;
mod sink;

pub use dom::{escape_attr, escape_text, Dom, NodeData, NodeId};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use sink::DomSink;

/// Parse a complete HTML page
pub fn parse_html(html: &str) -> Dom {
    parse_document(DomSink::new(), ParseOpts::default())
        .one(html)
        .into_dom()
}

/// A parsed body fragment whose content lives under `root`
pub struct HtmlFragment {
    dom: Dom,
    root: NodeId,
}

impl HtmlFragment {
    /// Parse HTML that would appear inside `<body>`
    pub fn parse(html: &str) -> Self {
        let wrapped = format!("<html><head></head><body>{}</body></html>", html);
        let dom = parse_html(&wrapped);
        let root = dom.body().unwrap_or_else(|| dom.document());
        Self { dom, root }
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    /// Container element of the fragment's top-level nodes
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Top-level nodes of the fragment
    pub fn top_level(&self) -> Vec<NodeId> {
        self.dom.children(self.root).collect()
    }

    /// Elements with the given tag, snapshotted in document order
    pub fn select(&self, tag: &str) -> Vec<NodeId> {
        self.dom.elements_by_tag(self.root, tag)
    }

    /// Parse `html` and splice its nodes in place of `target`
    pub fn replace_with_html(&mut self, target: NodeId, html: &str) {
        let other = HtmlFragment::parse(html);
        for node in other.top_level() {
            let copy = self.dom.import(&other.dom, node);
            self.dom.insert_before(target, copy);
        }
        self.dom.detach(target);
    }

    pub fn to_html(&self) -> String {
        self.dom.inner_html(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_roundtrip() {
        let html = "<p>Hello <em>world</em> &amp; more</p>\n<pre><code class=\"language-rust\">fn main() {}\n</code></pre>\n";
        let fragment = HtmlFragment::parse(html);
        assert_eq!(fragment.to_html(), html);
    }

    #[test]
    fn test_void_elements_and_attributes() {
        let fragment = HtmlFragment::parse(r#"<p><img src="a.png" alt="say &quot;hi&quot;"><br></p>"#);
        assert_eq!(
            fragment.to_html(),
            r#"<p><img src="a.png" alt="say &quot;hi&quot;"><br></p>"#
        );
    }

    #[test]
    fn test_select_is_document_order() {
        let fragment = HtmlFragment::parse(
            r#"<div><img src="1"><p><img src="2"></p></div><img src="3">"#,
        );
        let srcs: Vec<&str> = fragment
            .select("img")
            .into_iter()
            .filter_map(|id| fragment.dom().get_attr(id, "src"))
            .collect();
        assert_eq!(srcs, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_snapshot_survives_mutation() {
        let mut fragment = HtmlFragment::parse(r#"<p><a href="x">1</a></p><p><a href="y">2</a></p>"#);
        let anchors = fragment.select("a");
        fragment.replace_with_html(anchors[0], "<span>card</span>");
        let dom = fragment.dom_mut();
        dom.set_attr(anchors[1], "class", "kept");
        assert_eq!(
            fragment.to_html(),
            r#"<p><span>card</span></p><p><a href="y" class="kept">2</a></p>"#
        );
    }

    #[test]
    fn test_wrap_and_set_text() {
        let mut fragment = HtmlFragment::parse(r#"<p><img src="a.png"></p><pre><code><b>x</b> &lt; y</code></pre>"#);
        let img = fragment.select("img")[0];
        let code = fragment.select("code")[0];
        let dom = fragment.dom_mut();
        let link = dom.create_element("a", &[("href", "a.png")]);
        dom.wrap(img, link);
        let text = dom.text_content(code);
        dom.set_text(code, text);
        assert_eq!(
            fragment.to_html(),
            r#"<p><a href="a.png"><img src="a.png"></a></p><pre><code>x &lt; y</code></pre>"#
        );
    }

    #[test]
    fn test_parse_html_page_meta() {
        let dom = parse_html(
            r#"<!doctype html><html><head><meta property="og:title" content="T"></head><body></body></html>"#,
        );
        let metas = dom.elements_by_tag(dom.document(), "meta");
        assert_eq!(metas.len(), 1);
        assert_eq!(dom.get_attr(metas[0], "content"), Some("T"));
    }
}
