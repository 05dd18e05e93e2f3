use scraper::{ElementRef, Html, Selector};

use mn_core::dates;
use mn_core::{Candidate, ParsedArticle};

const SUBTITLE_SELECTOR: &str = "div[data-ds-component='article-title'] > div";
const AUTHOR_SELECTOR: &str = "div[data-ds-component='author-bio'] a";
const BODY_SELECTOR: &str = "article[data-ds-component='article']";
const TIME_SELECTOR: &str = "time[datetime]";

/// Ad slots, mid-article CTAs and embeds removed from the body before text
/// extraction.
const BOILERPLATE_SELECTOR: &str =
    "div[data-ds-component='ad'], div.cta-middle, iframe, div[data-component-type='ads']";

/// Extracts subtitle, author name, body text and publish timestamp from an
/// article detail page. Missing pieces degrade to `None` (or the empty
/// string for the body); nothing here fails the candidate.
pub struct DetailParser {
    subtitle: Selector,
    author: Selector,
    body: Selector,
    boilerplate: Selector,
    time: Selector,
}

impl DetailParser {
    pub fn new() -> Self {
        Self {
            subtitle: Selector::parse(SUBTITLE_SELECTOR).unwrap(),
            author: Selector::parse(AUTHOR_SELECTOR).unwrap(),
            body: Selector::parse(BODY_SELECTOR).unwrap(),
            boilerplate: Selector::parse(BOILERPLATE_SELECTOR).unwrap(),
            time: Selector::parse(TIME_SELECTOR).unwrap(),
        }
    }

    pub fn parse(&self, html: &str, candidate: &Candidate) -> ParsedArticle {
        let mut document = Html::parse_document(html);

        let subtitle = first_text(&document, &self.subtitle);
        let author_name = first_text(&document, &self.author);

        let publish_at = document
            .select(&self.time)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .and_then(dates::parse_publish_datetime);

        let content = self.extract_content(&mut document);

        ParsedArticle {
            candidate: candidate.clone(),
            subtitle,
            content,
            publish_at,
            author_name,
        }
    }

    /// Body text of the article element with boilerplate children detached
    /// first, so ad copy never leaks into the stored content.
    fn extract_content(&self, document: &mut Html) -> String {
        let target = document.select(&self.body).next().map(|article| {
            let ids: Vec<_> = article.select(&self.boilerplate).map(|el| el.id()).collect();
            (article.id(), ids)
        });
        let Some((article_id, doomed)) = target else {
            return String::new();
        };

        for id in doomed {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }

        document
            .tree
            .get(article_id)
            .and_then(ElementRef::wrap)
            .map(element_text)
            .unwrap_or_default()
    }
}

impl Default for DetailParser {
    fn default() -> Self {
        Self::new()
    }
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Whitespace-normalized text of an element, the way Jsoup's `text()`
/// renders it.
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
