//! Appointment availability detection.
//!
//! Detection runs in two stages over the parsed page:
//!
//! 1. **Anchor search** finds every text node containing one of the booking
//!    phrases and resolves it to its nearest structural container
//!    (`tr`, `li`, `div`, `section`). These are the candidate sections.
//! 2. **Corroboration search** looks for a shopping-cart marker inside the
//!    candidate sections only. Cart icons (`<i class="fa-shopping-cart">`) are
//!    searched first; elements with a cart-like class are the fallback.
//!
//! The page always mentions "Anmeldung" somewhere, so a verdict is only
//! positive when both stages succeed.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::DetectorConfig;

/// Phrases that only show up next to a bookable appointment.
pub const BOOKING_KEYWORDS: &[&str] = &["termin anmeldung", "anmeldung zum einbürgerungstest"];

pub const CONTAINER_TAGS: &[&str] = &["tr", "li", "div", "section"];

pub const CART_ICON_TAG: &str = "i";

/// Font Awesome class used by the booking system's cart buttons.
pub const CART_ICON_CLASS: &str = "fa-shopping-cart";

pub const CART_CLASS_MARKERS: &[&str] = &["shopping-cart", "warenkorb"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// An `<i>` icon carrying the cart icon-font class.
    CartIcon,
    /// Any element whose class mentions a cart.
    CartClass,
}

impl MarkerKind {
    /// Search order of the corroboration tiers.
    pub const TIERS: [MarkerKind; 2] = [MarkerKind::CartIcon, MarkerKind::CartClass];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub available: bool,
    pub candidate_sections: usize,
    pub markers: usize,
    pub marker_kind: Option<MarkerKind>,
}

impl Verdict {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            candidate_sections: 0,
            markers: 0,
            marker_kind: None,
        }
    }
}

/// Markers found by the corroboration stage, together with the tier that
/// produced them.
#[derive(Debug, Clone)]
pub struct MarkerSearch<'a> {
    pub kind: Option<MarkerKind>,
    pub markers: Vec<ElementRef<'a>>,
}

impl MarkerSearch<'_> {
    fn empty() -> Self {
        Self {
            kind: None,
            markers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AvailabilityDetector {
    booking_keywords: Vec<String>,
    container_tags: Vec<String>,
    cart_icon_class: String,
    cart_class_markers: Vec<String>,
}

impl Default for AvailabilityDetector {
    fn default() -> Self {
        Self::from_config(&DetectorConfig::default())
    }
}

impl AvailabilityDetector {
    pub fn from_config(config: &DetectorConfig) -> Self {
        let lower = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .map(|v| normalize_text(v))
                .filter(|v| !v.is_empty())
                .collect()
        };

        Self {
            booking_keywords: lower(&config.booking_keywords),
            container_tags: lower(&config.container_tags),
            cart_icon_class: config.cart_icon_class.trim().to_lowercase(),
            cart_class_markers: lower(&config.cart_class_markers),
        }
    }

    /// Parse `html` and decide whether appointments can be booked.
    ///
    /// Never fails: malformed markup is repaired by the HTML5 parser and an
    /// empty document simply yields no candidate sections.
    pub fn detect(&self, html: &str) -> Verdict {
        let document = Html::parse_document(html);

        let sections = self.find_candidate_sections(&document);
        let search = self.find_markers(&sections);
        let available = !sections.is_empty() && !search.markers.is_empty();

        debug!(
            candidate_sections = sections.len(),
            markers = search.markers.len(),
            marker_kind = ?search.kind,
            available,
            "Appointment detection finished"
        );

        Verdict {
            available,
            candidate_sections: sections.len(),
            markers: search.markers.len(),
            marker_kind: search.kind,
        }
    }

    /// Stage 1: containers holding a booking phrase, in document order and
    /// without duplicates.
    pub fn find_candidate_sections<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let mut sections: Vec<ElementRef<'a>> = Vec::new();

        for node in document.tree.root().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            if !self.contains_booking_keyword(text) {
                continue;
            }

            let container = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|element| self.is_container(element));

            match container {
                Some(container) if !sections.iter().any(|s| s.id() == container.id()) => {
                    trace!(tag = container.value().name(), "Candidate section found");
                    sections.push(container);
                }
                Some(_) => {}
                None => trace!("Booking phrase outside of any container, ignored"),
            }
        }

        sections
    }

    /// Stage 2: corroborating cart markers inside `sections`.
    ///
    /// Tiers are tried in order and the first tier with any hit wins, so the
    /// class fallback only runs when no section contains a cart icon.
    pub fn find_markers<'a>(&self, sections: &[ElementRef<'a>]) -> MarkerSearch<'a> {
        for tier in MarkerKind::TIERS {
            let mut markers: Vec<ElementRef<'a>> = Vec::new();
            for section in sections {
                for marker in self.markers_in_section(*section, tier) {
                    // Nested sections can share descendants.
                    if !markers.iter().any(|m| m.id() == marker.id()) {
                        markers.push(marker);
                    }
                }
            }

            if !markers.is_empty() {
                return MarkerSearch {
                    kind: Some(tier),
                    markers,
                };
            }
        }

        MarkerSearch::empty()
    }

    /// Markers of a single tier below `section`. The section element itself
    /// is not a candidate.
    pub fn markers_in_section<'a>(&self, section: ElementRef<'a>, tier: MarkerKind) -> Vec<ElementRef<'a>> {
        section
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|element| self.is_marker(element, tier))
            .collect()
    }

    fn contains_booking_keyword(&self, text: &str) -> bool {
        let text = normalize_text(text);
        !text.is_empty() && self.booking_keywords.iter().any(|k| text.contains(k.as_str()))
    }

    fn is_container(&self, element: &ElementRef<'_>) -> bool {
        let name = element.value().name();
        self.container_tags.iter().any(|tag| tag.eq_ignore_ascii_case(name))
    }

    fn is_marker(&self, element: &ElementRef<'_>, tier: MarkerKind) -> bool {
        let Some(class) = element.value().attr("class") else {
            return false;
        };
        let class = class.to_lowercase();

        match tier {
            MarkerKind::CartIcon => {
                !self.cart_icon_class.is_empty()
                    && element.value().name().eq_ignore_ascii_case(CART_ICON_TAG)
                    && class.contains(self.cart_icon_class.as_str())
            }
            MarkerKind::CartClass => self
                .cart_class_markers
                .iter()
                .any(|marker| class.contains(marker.as_str())),
        }
    }
}

/// Detect with the built-in keyword and marker sets.
pub fn detect(html: &str) -> Verdict {
    AvailabilityDetector::default().detect(html)
}

/// Lower-cases and collapses whitespace runs (including `&nbsp;`) so that
/// phrases wrapped over several lines still match.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
