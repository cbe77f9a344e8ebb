//! Home payload schema and the view-ready sections derived from it.
//!
//! The API returns one document: a `home` layout (sections that reference
//! entities by id) plus flat entity lists. [`HomeResponse::resolve_sections`]
//! joins the two.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Full response of the home endpoint. Also the cached snapshot payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub home: HomePayload,
    pub categories: Vec<CategoryModel>,
    pub shops: Vec<ShopModel>,
    pub banners: Vec<BannerModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<TagModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<LabelModel>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faq: Option<FaqPayload>,
    pub sections: Vec<HomeSectionPayload>,
}

/// One layout entry: a typed list of entity ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSectionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub section_type: HomeSectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<String>,
    pub list: Vec<String>,
}

/// Closed set of section kinds. Anything else fails decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HomeSectionType {
    #[serde(rename = "CATEGORY")]
    Category,
    #[serde(rename = "BANNER")]
    Banner,
    #[serde(rename = "SHOP")]
    Shop,
    #[serde(rename = "FIXEDBANNER")]
    FixedBanner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryModel {
    pub id: String,
    pub title: String,
    pub icon_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopModel {
    pub id: String,
    pub title: String,
    pub icon_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<ShopAbout>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub shop_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopAbout {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerModel {
    pub id: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagModel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelModel {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqPayload {
    pub id: String,
    pub title: String,
    pub sections: Vec<FaqSectionItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqSectionItem {
    pub title: String,
    pub description: String,
}

/// A layout section with its ids replaced by the referenced entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HomeSection {
    Category {
        title: Option<String>,
        items: Vec<CategoryModel>,
    },
    Banner {
        items: Vec<BannerModel>,
    },
    Shop {
        title: Option<String>,
        items: Vec<ShopModel>,
    },
    FixedBanner {
        title: Option<String>,
        items: Vec<BannerModel>,
    },
}

impl HomeSection {
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        match self {
            Self::Category { title, .. } | Self::Shop { title, .. } | Self::FixedBanner { title, .. } => {
                title.as_deref()
            }
            Self::Banner { .. } => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Category { items, .. } => items.len(),
            Self::Banner { items } | Self::FixedBanner { items, .. } => items.len(),
            Self::Shop { items, .. } => items.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HomeResponse {
    /// Whether the layout enables the search entry point. Absent means no.
    #[must_use]
    pub fn has_search(&self) -> bool {
        self.home.search.unwrap_or(false)
    }

    #[must_use]
    pub const fn faq(&self) -> Option<&FaqPayload> {
        self.home.faq.as_ref()
    }

    /// Join every section's id list against the entity lists.
    ///
    /// Section order and in-section id order follow the payload; ids with no
    /// matching entity are dropped.
    #[must_use]
    pub fn resolve_sections(&self) -> Vec<HomeSection> {
        let categories: HashMap<&str, &CategoryModel> =
            self.categories.iter().map(|c| (c.id.as_str(), c)).collect();
        let shops: HashMap<&str, &ShopModel> = self.shops.iter().map(|s| (s.id.as_str(), s)).collect();
        let banners: HashMap<&str, &BannerModel> =
            self.banners.iter().map(|b| (b.id.as_str(), b)).collect();

        self.home
            .sections
            .iter()
            .map(|section| {
                let title = section.title.clone();
                match section.section_type {
                    HomeSectionType::Category => HomeSection::Category {
                        title,
                        items: lookup(&section.list, &categories),
                    },
                    HomeSectionType::Banner => HomeSection::Banner {
                        items: lookup(&section.list, &banners),
                    },
                    HomeSectionType::Shop => HomeSection::Shop {
                        title,
                        items: lookup(&section.list, &shops),
                    },
                    HomeSectionType::FixedBanner => HomeSection::FixedBanner {
                        title,
                        items: lookup(&section.list, &banners),
                    },
                }
            })
            .collect()
    }
}

fn lookup<T: Clone>(ids: &[String], by_id: &HashMap<&str, &T>) -> Vec<T> {
    ids.iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|item| (*item).clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decoder::ResponseDecoder;
    use crate::error::NetworkError;
    use crate::test_utils::{SAMPLE_HOME_JSON, make_test_home_response};

    #[test]
    fn decodes_full_payload() {
        let response: HomeResponse = ResponseDecoder::new()
            .decode(SAMPLE_HOME_JSON.as_bytes())
            .unwrap();

        assert!(response.has_search());
        assert_eq!(response.home.sections.len(), 4);
        assert_eq!(response.home.sections[3].section_type, HomeSectionType::FixedBanner);
        assert_eq!(response.shops[0].about.as_ref().unwrap().title.as_deref(), Some("About"));
        assert_eq!(response.faq().unwrap().sections.len(), 1);
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let json = r#"{
            "home": {"sections": []},
            "categories": [],
            "shops": [{"id":"s1","title":"Shop","iconUrl":"u"}],
            "banners": []
        }"#;
        let response: HomeResponse = ResponseDecoder::new().decode(json.as_bytes()).unwrap();

        assert!(!response.has_search());
        assert!(response.tags.is_none());
        assert!(response.labels.is_none());
        assert!(response.shops[0].tags.is_none());
    }

    #[test]
    fn unknown_section_type_fails() {
        let json = r#"{
            "home": {"sections": [{"type":"CAROUSEL","list":[]}]},
            "categories": [], "shops": [], "banners": []
        }"#;
        let result: Result<HomeResponse, _> = ResponseDecoder::new().decode(json.as_bytes());
        assert_eq!(result, Err(NetworkError::DecodingFailed));
    }

    #[test]
    fn missing_required_field_fails() {
        let json = r#"{"home": {"sections": []}, "categories": [], "shops": []}"#;
        let result: Result<HomeResponse, _> = ResponseDecoder::new().decode(json.as_bytes());
        assert_eq!(result, Err(NetworkError::DecodingFailed));
    }

    #[test]
    fn resolves_sections_in_payload_order_and_drops_unknown_ids() {
        let response = make_test_home_response(&["Apple Store", "Banana Shop"]);
        let mut sections = response.home.sections.clone();
        sections[1].list = vec!["missing".to_string(), "shop-2".to_string(), "shop-1".to_string()];
        let response = HomeResponse {
            home: HomePayload {
                sections,
                ..response.home.clone()
            },
            ..response
        };

        let resolved = response.resolve_sections();

        assert!(matches!(resolved[0], HomeSection::Category { .. }));
        match &resolved[1] {
            HomeSection::Shop { items, .. } => {
                let ids: Vec<_> = items.iter().map(|s| s.id.as_str()).collect();
                assert_eq!(ids, ["shop-2", "shop-1"]);
            }
            other => panic!("expected shop section, got {other:?}"),
        }
    }

    #[test]
    fn section_serializes_with_type_tag() {
        let section = HomeSection::Banner { items: vec![] };
        let json = serde_json::to_value(&section).unwrap();
        assert_eq!(json["type"], "banner");
        assert!(section.is_empty());
        assert_eq!(section.title(), None);
    }

    #[test]
    fn payload_round_trips_through_cache_encoding() {
        let response = make_test_home_response(&["Apple Store"]);
        let bytes = serde_json::to_vec(&response).unwrap();
        let decoded: HomeResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, response);
    }
}
