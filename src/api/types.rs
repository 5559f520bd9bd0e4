//! Wire types shared between the REST client and the table views.

use serde::{Deserialize, Serialize};

/// One server-authoritative page of a list response.
///
/// The backend never returns whole collections to paginated screens; each
/// response carries the requested page plus the total row count the
/// pagination footer is computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub total: u64,
}

/// Sort direction, serialized the way the backend expects ("asc"/"desc").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  Desc,
}

impl SortDirection {
  pub fn as_str(&self) -> &'static str {
    match self {
      SortDirection::Asc => "asc",
      SortDirection::Desc => "desc",
    }
  }
}

/// Server-side sort specification for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
  pub field: String,
  pub direction: SortDirection,
}

impl SortSpec {
  /// Encode as the JSON object the backend parses out of the `sort`
  /// query parameter: `{"field":"name","sort":"asc"}`.
  pub fn to_param(&self) -> String {
    format!(
      r#"{{"field":"{}","sort":"{}"}}"#,
      self.field,
      self.direction.as_str()
    )
  }
}

/// Request parameters for a paginated list read.
///
/// Also serves as the serialized-parameter half of the cache key, so two
/// screens asking for the same page share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageParams {
  pub page: u64,
  pub page_size: u64,
  pub sort: Option<SortSpec>,
  pub search: String,
}

impl Default for PageParams {
  fn default() -> Self {
    Self {
      page: 0,
      page_size: 20,
      sort: None,
      search: String::new(),
    }
  }
}

impl PageParams {
  /// Query pairs for the list endpoint. `search` is always sent (an empty
  /// search is the unfiltered view); `sort` only when set.
  pub fn to_query(&self) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
      ("page", self.page.to_string()),
      ("pageSize", self.page_size.to_string()),
      ("search", self.search.clone()),
    ];
    if let Some(sort) = &self.sort {
      pairs.push(("sort", sort.to_param()));
    }
    pairs
  }
}

/// A registered donor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donor {
  #[serde(rename = "_id")]
  pub id: String,
  pub name: String,
  pub email: String,
  pub phone: String,
  #[serde(default)]
  pub score: i64,
  #[serde(default)]
  pub rank: i64,
}

/// A donation event (tree plantation drives and the like).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationEvent {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(rename = "eventID")]
  pub event_id: String,
  #[serde(rename = "eventName")]
  pub name: String,
  #[serde(rename = "eventDate")]
  pub date: String,
  pub province: String,
  pub district: String,
  pub city: String,
  #[serde(default)]
  pub comments: String,
}

/// An inventory item recorded against a donor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(rename = "itemID")]
  pub item_id: String,
  #[serde(rename = "itemName")]
  pub name: String,
  #[serde(default)]
  pub quantity: i64,
  #[serde(rename = "donorId")]
  pub donor_id: String,
  pub date: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sort_param_encoding() {
    let sort = SortSpec {
      field: "eventName".to_string(),
      direction: SortDirection::Desc,
    };
    assert_eq!(sort.to_param(), r#"{"field":"eventName","sort":"desc"}"#);
  }

  #[test]
  fn test_page_params_query_pairs() {
    let params = PageParams {
      page: 2,
      page_size: 50,
      sort: None,
      search: String::new(),
    };
    let pairs = params.to_query();
    assert_eq!(
      pairs,
      vec![
        ("page", "2".to_string()),
        ("pageSize", "50".to_string()),
        ("search", String::new()),
      ]
    );
  }

  #[test]
  fn test_page_params_include_sort_when_set() {
    let params = PageParams {
      sort: Some(SortSpec {
        field: "name".to_string(),
        direction: SortDirection::Asc,
      }),
      ..PageParams::default()
    };
    let pairs = params.to_query();
    assert!(pairs.iter().any(|(k, _)| *k == "sort"));
  }

  #[test]
  fn test_donor_deserializes_mongo_shape() {
    let donor: Donor = serde_json::from_str(
      r#"{"_id":"65a1","name":"Amal","email":"amal@example.com","phone":"0771234567"}"#,
    )
    .expect("donor should parse");
    assert_eq!(donor.id, "65a1");
    assert_eq!(donor.score, 0);
  }

  #[test]
  fn test_page_deserializes() {
    let page: Page<InventoryItem> = serde_json::from_str(
      r#"{"items":[{"_id":"1","itemID":"IT-1","itemName":"Saplings","quantity":40,"donorId":"65a1","date":"2024-01-10"}],"total":87}"#,
    )
    .expect("page should parse");
    assert_eq!(page.total, 87);
    assert_eq!(page.items[0].name, "Saplings");
  }
}
