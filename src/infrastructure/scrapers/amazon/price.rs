//! Picks the price a shopper would pay out of all the price-looking nodes on
//! an Amazon product page.
//!
//! Candidates are gathered by a cascade of selector strategies, each with a
//! base score. Scores are then adjusted from the node's surroundings:
//! strikethrough prices are set aside as list prices, shipping/tax/per-unit
//! mentions are penalized, buy-box prices get a bonus and other-seller offers
//! a penalty. The best non-list candidate wins; ties go to the earlier
//! strategy, then to document order.

use super::selectors::price as sel;
use crate::domain::{PriceQuote, PriceStrategy};
use crate::utils::{collapse_whitespace, detect_currency, element_text, parse_price};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::cmp::Reverse;
use tracing::debug;

const PENALTY_CONTEXT: i32 = -60;
const PENALTY_OTHER_SELLER: i32 = -40;
const BONUS_BUYBOX: i32 = 15;

/// How much of the surrounding text is inspected.
const CONTEXT_CHARS: usize = 200;

static SURCHARGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(shipping|delivery|taxes|tax|import fees?|deposit)\b|/\s*(count|ounce|fl oz|oz|gram|lb|unit|item)\b|\bper\s+(count|unit|item|ounce)\b",
    )
    .unwrap()
});

static LIST_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(list price|list:|was:?|typical price|m\.?r\.?p)").unwrap());

const INLINE_TAGS: &[&str] = &["span", "td", "label", "b", "strong", "i", "font", "a", "p"];
const STRIKE_CLASSES: &[&str] = &["a-text-price", "a-text-strike", "priceBlockStrikePriceString"];
const BUYBOX_IDS: &[&str] = &["buybox", "desktop_buybox"];
const OTHER_SELLER_MARKERS: &[&str] = &["aod-", "mbc", "olp", "usedbuybox", "used_buybox"];

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCandidate {
    pub amount: f64,
    pub currency: &'static str,
    pub strategy: PriceStrategy,
    pub score: i32,
    pub is_list: bool,
    /// Visit order across all strategies.
    pub order: usize,
}

fn base_score(strategy: PriceStrategy) -> i32 {
    match strategy {
        PriceStrategy::PriceToPay => 100,
        PriceStrategy::CorePrice => 90,
        PriceStrategy::LegacyBlock => 70,
        PriceStrategy::SplitPrice => 50,
        PriceStrategy::AnyOffscreen => 30,
        PriceStrategy::Listing => 10,
    }
}

fn ancestors_or_self<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    std::iter::once(element).chain(element.ancestors().filter_map(ElementRef::wrap))
}

fn has_class(element: &ElementRef, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// The `.a-price` wrapper an offscreen or split price belongs to, so the same
/// visible price is only counted once.
fn price_container(element: ElementRef) -> ElementRef {
    ancestors_or_self(element)
        .find(|e| has_class(e, "a-price"))
        .unwrap_or(element)
}

fn parent_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

fn previous_element<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.prev_siblings().find_map(ElementRef::wrap)
}

fn truncated_text(element: &ElementRef) -> String {
    element_text(element).chars().take(CONTEXT_CHARS).collect()
}

fn is_strikethrough(container: ElementRef) -> bool {
    ancestors_or_self(container).take(4).any(|e| {
        let value = e.value();
        let struck = value
            .attr("data-a-strike")
            .map_or(false, |v| !v.eq_ignore_ascii_case("false"));
        struck
            || value.id() == Some("listPrice")
            || STRIKE_CLASSES.iter().any(|class| has_class(&e, class))
    })
}

/// Text right around the price: the whole parent when it is an inline
/// wrapper, otherwise only the adjacent text nodes.
fn surrounding_text(container: &ElementRef) -> String {
    if let Some(parent) = parent_element(container) {
        if INLINE_TAGS.contains(&parent.value().name()) {
            return truncated_text(&parent);
        }
    }

    let mut text = String::new();
    for sibling in [container.prev_sibling(), container.next_sibling()]
        .into_iter()
        .flatten()
    {
        if let Some(t) = sibling.value().as_text() {
            text.push_str(t);
            text.push(' ');
        }
    }
    collapse_whitespace(&text).chars().take(CONTEXT_CHARS).collect()
}

/// Text of the nearest label in front of the price, looking one level up for
/// table-cell layouts.
fn label_text(container: &ElementRef) -> Option<String> {
    previous_element(container)
        .or_else(|| parent_element(container).and_then(|p| previous_element(&p)))
        .map(|label| truncated_text(&label))
}

struct Ancestry {
    in_buybox: bool,
    other_seller: bool,
    surcharge_block: bool,
}

fn ancestry(container: ElementRef) -> Ancestry {
    let mut result = Ancestry {
        in_buybox: false,
        other_seller: false,
        surcharge_block: false,
    };

    for element in ancestors_or_self(container) {
        let value = element.value();
        let id = value.id().unwrap_or_default();

        if BUYBOX_IDS.contains(&id) {
            result.in_buybox = true;
        }

        let tokens = std::iter::once(id)
            .chain(value.classes())
            .map(str::to_lowercase)
            .collect::<Vec<_>>();

        for token in &tokens {
            if OTHER_SELLER_MARKERS.iter().any(|m| token.starts_with(m)) {
                result.other_seller = true;
            }
            if token.contains("delivery") || token.contains("shipping") {
                result.surcharge_block = true;
            }
        }
    }

    result
}

struct Collector<'a> {
    seen: Vec<ElementRef<'a>>,
    candidates: Vec<PriceCandidate>,
}

impl<'a> Collector<'a> {
    fn new() -> Self {
        Self {
            seen: Vec::new(),
            candidates: Vec::new(),
        }
    }

    fn add(
        &mut self,
        strategy: PriceStrategy,
        node: ElementRef<'a>,
        amount: f64,
        currency: &'static str,
    ) {
        let container = price_container(node);
        if self.seen.contains(&container) {
            return;
        }
        self.seen.push(container);

        let context = surrounding_text(&container);
        let label = label_text(&container).unwrap_or_default();
        let surroundings = ancestry(container);

        let mut score = base_score(strategy);
        let surcharge = SURCHARGE.is_match(&context) || surroundings.surcharge_block;
        if surcharge {
            score += PENALTY_CONTEXT;
        }
        if surroundings.in_buybox {
            score += BONUS_BUYBOX;
        }
        if surroundings.other_seller {
            score += PENALTY_OTHER_SELLER;
        }

        let is_list = !surcharge
            && (is_strikethrough(container)
                || LIST_LABEL.is_match(&label)
                || LIST_LABEL.is_match(&context));

        let candidate = PriceCandidate {
            amount,
            currency,
            strategy,
            score,
            is_list,
            order: self.candidates.len(),
        };
        debug!("Price candidate {:?}", candidate);
        self.candidates.push(candidate);
    }

    fn add_text_matches(
        &mut self,
        document: &'a Html,
        selector: &Selector,
        strategy: PriceStrategy,
    ) {
        for node in document.select(selector) {
            let text = element_text(&node);
            if let Some(amount) = parse_price(&text) {
                self.add(strategy, node, amount, detect_currency(&text));
            }
        }
    }

    fn add_split_prices(&mut self, document: &'a Html) {
        for whole in document.select(&sel::PRICE_WHOLE) {
            let Some(parent) = parent_element(&whole) else {
                continue;
            };

            let whole_digits: String = element_text(&whole)
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            if whole_digits.is_empty() {
                continue;
            }

            let fraction_digits: String = parent
                .select(&sel::PRICE_FRACTION)
                .next()
                .map(|f| element_text(&f))
                .unwrap_or_default()
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            let fraction = if fraction_digits.is_empty() {
                "00".to_string()
            } else {
                fraction_digits
            };

            let Some(amount) = parse_price(&format!("{}.{}", whole_digits, fraction)) else {
                continue;
            };
            let currency = detect_currency(&element_text(&parent));
            self.add(PriceStrategy::SplitPrice, whole, amount, currency);
        }
    }
}

/// Runs every strategy over the page and returns the scored candidates in
/// visit order.
pub fn collect_candidates(document: &Html) -> Vec<PriceCandidate> {
    let mut collector = Collector::new();

    collector.add_text_matches(document, &sel::PRICE_TO_PAY, PriceStrategy::PriceToPay);
    collector.add_text_matches(document, &sel::CORE_PRICE, PriceStrategy::CorePrice);
    collector.add_text_matches(document, &sel::LEGACY_BLOCK, PriceStrategy::LegacyBlock);
    collector.add_split_prices(document);
    collector.add_text_matches(document, &sel::ANY_OFFSCREEN, PriceStrategy::AnyOffscreen);

    collector.candidates
}

fn rank(candidate: &&PriceCandidate) -> (Reverse<i32>, PriceStrategy, usize) {
    (Reverse(candidate.score), candidate.strategy, candidate.order)
}

pub fn choose_price(candidates: &[PriceCandidate]) -> Option<PriceQuote> {
    let current = candidates
        .iter()
        .filter(|c| !c.is_list && c.score > 0)
        .min_by_key(rank)?;

    let list = candidates
        .iter()
        .filter(|c| c.is_list && c.score > 0)
        .min_by_key(rank)
        .map(|c| c.amount)
        .filter(|&amount| amount > current.amount);

    Some(PriceQuote {
        current: current.amount,
        list,
        currency: current.currency.to_string(),
        strategy: current.strategy,
    })
}

pub fn extract_price(document: &Html) -> Option<PriceQuote> {
    let candidates = collect_candidates(document);
    let quote = choose_price(&candidates);
    debug!(
        "Chose {:?} out of {} price candidates",
        quote,
        candidates.len()
    );
    quote
}
