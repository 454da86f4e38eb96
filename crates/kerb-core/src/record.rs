//! Record — one household or establishment's survey entry.
//!
//! The wire shape is the camelCase JSON the scripted store keeps in its
//! sheet. Spreadsheets tend to hand values back with their own idea of
//! types (a house number becomes a number, an empty cell becomes `""`), so
//! decoding is lenient where the sheet is known to interfere.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ValidationError, vocab};

// ─── Record ──────────────────────────────────────────────────────────────────

/// The unit of persistence. `id` and `timestamp` are minted once by
/// [`Record::create`] and carried over unchanged by [`Record::revise`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
  #[serde(deserialize_with = "lenient::text")]
  pub id:                 String,
  #[serde(default, deserialize_with = "lenient::text")]
  pub timestamp:          String,
  #[serde(default, deserialize_with = "lenient::text")]
  pub address_type:       String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::opt_text"
  )]
  pub address_type_other: Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub community:          String,
  #[serde(default, deserialize_with = "lenient::text")]
  pub full_name:          String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::opt_text"
  )]
  pub shop_name:          Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub address:            String,
  #[serde(default, deserialize_with = "lenient::text")]
  pub street:             String,
  #[serde(default, deserialize_with = "lenient::text")]
  pub phone:              String,
  #[serde(default, deserialize_with = "lenient::household_size")]
  pub household_size:     u32,
  #[serde(default, deserialize_with = "lenient::methods")]
  pub waste_methods:      Vec<String>,
  #[serde(default, deserialize_with = "lenient::methods")]
  pub water_methods:      Vec<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub responsible_person: String,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::opt_text"
  )]
  pub image_url:          Option<String>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::coordinate"
  )]
  pub lat:                Option<f64>,
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "lenient::coordinate"
  )]
  pub lng:                Option<f64>,
}

impl Record {
  /// Build a brand-new record from a validated draft, minting its identity.
  pub fn create(draft: RecordDraft, image_url: Option<String>) -> Self {
    let id = Uuid::new_v4().to_string();
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    draft.into_record(id, timestamp, image_url)
  }

  /// Apply an edited draft to `original`. Identity and creation time are
  /// preserved; the image is replaced only when a new URL is supplied.
  pub fn revise(
    original: &Record,
    draft: RecordDraft,
    image_url: Option<String>,
  ) -> Self {
    draft.into_record(
      original.id.clone(),
      original.timestamp.clone(),
      image_url.or_else(|| original.image_url.clone()),
    )
  }

  /// The address type to show: the free-text description when the "other"
  /// sentinel was chosen.
  pub fn display_address_type(&self) -> &str {
    match (&*self.address_type, &self.address_type_other) {
      (vocab::OTHER, Some(other)) => other.as_str(),
      (t, _) => t,
    }
  }

  /// Directions link for records that carry a map pin.
  pub fn navigation_url(&self) -> Option<String> {
    match (self.lat, self.lng) {
      (Some(lat), Some(lng)) => Some(format!(
        "https://www.google.com/maps/dir/?api=1&destination={lat},{lng}"
      )),
      _ => None,
    }
  }
}

/// Round a coordinate to the 6-decimal precision the map pin reports.
pub fn round_coordinate(value: f64) -> f64 {
  (value * 1_000_000.0).round() / 1_000_000.0
}

// ─── Draft ───────────────────────────────────────────────────────────────────

/// Form input for a record, before identity is assigned.
///
/// Optional text fields use the empty string for "not given"; they become
/// `None` on the way into a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
  pub address_type:       String,
  pub address_type_other: String,
  pub community:          String,
  pub street:             String,
  pub full_name:          String,
  pub shop_name:          String,
  pub address:            String,
  pub phone:              String,
  pub household_size:     u32,
  pub waste_methods:      Vec<String>,
  pub water_methods:      Vec<String>,
  pub responsible_person: String,
  pub lat:                Option<f64>,
  pub lng:                Option<f64>,
}

impl Default for RecordDraft {
  fn default() -> Self {
    Self {
      address_type:       vocab::ADDRESS_TYPES[0].to_string(),
      address_type_other: String::new(),
      community:          vocab::COMMUNITIES[0].to_string(),
      street:             vocab::STREETS[0].to_string(),
      full_name:          String::new(),
      shop_name:          String::new(),
      address:            String::new(),
      phone:              String::new(),
      household_size:     1,
      waste_methods:      Vec::new(),
      water_methods:      Vec::new(),
      responsible_person: vocab::RESPONSIBLE_PERSONS[0].to_string(),
      lat:                Some(vocab::DEFAULT_LAT),
      lng:                Some(vocab::DEFAULT_LNG),
    }
  }
}

impl RecordDraft {
  /// Pre-fill a draft from an existing record for editing.
  pub fn from_record(record: &Record) -> Self {
    Self {
      address_type:       record.address_type.clone(),
      address_type_other: record.address_type_other.clone().unwrap_or_default(),
      community:          record.community.clone(),
      street:             record.street.clone(),
      full_name:          record.full_name.clone(),
      shop_name:          record.shop_name.clone().unwrap_or_default(),
      address:            record.address.clone(),
      phone:              record.phone.clone(),
      household_size:     record.household_size,
      waste_methods:      record.waste_methods.clone(),
      water_methods:      record.water_methods.clone(),
      responsible_person: record.responsible_person.clone(),
      lat:                record.lat,
      lng:                record.lng,
    }
  }

  /// The name the record will be saved under.
  pub fn name(&self) -> &str { self.full_name.trim() }

  /// Check everything that can be checked without the store.
  ///
  /// Required fields come first, then the method selections, matching the
  /// order the form reports them in.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.full_name.trim().is_empty() {
      return Err(ValidationError::MissingField("full name"));
    }
    if self.address.trim().is_empty() {
      return Err(ValidationError::MissingField("address"));
    }
    if self.household_size < 1 {
      return Err(ValidationError::HouseholdSize);
    }
    if self.address_type == vocab::OTHER
      && self.address_type_other.trim().is_empty()
    {
      return Err(ValidationError::MissingOtherAddressType);
    }
    check_option("address type", vocab::ADDRESS_TYPES, &self.address_type)?;
    check_option("community", vocab::COMMUNITIES, &self.community)?;
    check_option("street", vocab::STREETS, &self.street)?;
    check_option(
      "responsible person",
      vocab::RESPONSIBLE_PERSONS,
      &self.responsible_person,
    )?;

    if self.waste_methods.is_empty() {
      return Err(ValidationError::NoWasteMethod);
    }
    if self.water_methods.is_empty() {
      return Err(ValidationError::NoWaterMethod);
    }
    for m in &self.waste_methods {
      check_option("waste method", vocab::WASTE_METHODS, m)?;
    }
    for m in &self.water_methods {
      check_option("water method", vocab::WATER_METHODS, m)?;
    }
    Ok(())
  }

  fn into_record(
    self,
    id: String,
    timestamp: String,
    image_url: Option<String>,
  ) -> Record {
    let address_type_other = (self.address_type == vocab::OTHER)
      .then(|| non_blank(self.address_type_other))
      .flatten();
    Record {
      id,
      timestamp,
      address_type: self.address_type,
      address_type_other,
      community: self.community,
      full_name: self.full_name.trim().to_string(),
      shop_name: non_blank(self.shop_name),
      address: self.address.trim().to_string(),
      street: self.street,
      phone: self.phone.trim().to_string(),
      household_size: self.household_size,
      waste_methods: dedup(self.waste_methods),
      water_methods: dedup(self.water_methods),
      responsible_person: self.responsible_person,
      image_url: image_url.and_then(non_blank),
      lat: self.lat.map(round_coordinate),
      lng: self.lng.map(round_coordinate),
    }
  }
}

fn check_option(
  field: &'static str,
  options: &[&str],
  value: &str,
) -> Result<(), ValidationError> {
  if vocab::allows(options, value) {
    Ok(())
  } else {
    Err(ValidationError::UnknownOption {
      field,
      value: value.to_string(),
    })
  }
}

fn non_blank(s: String) -> Option<String> {
  let t = s.trim();
  (!t.is_empty()).then(|| t.to_string())
}

/// Keep first occurrences, preserving selection order.
fn dedup(methods: Vec<String>) -> Vec<String> {
  let mut out: Vec<String> = Vec::with_capacity(methods.len());
  for m in methods {
    if !out.contains(&m) {
      out.push(m);
    }
  }
  out
}

// ─── Lenient decoding ────────────────────────────────────────────────────────

mod lenient {
  use serde::{Deserialize, Deserializer};

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Cell {
    Number(f64),
    Text(String),
    Bool(bool),
  }

  impl Cell {
    fn into_text(self) -> String {
      match self {
        // Integral numbers print without a trailing ".0".
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
          format!("{}", n as i64)
        }
        Cell::Number(n) => n.to_string(),
        Cell::Text(s) => s,
        Cell::Bool(b) => b.to_string(),
      }
    }

    fn into_number(self) -> Option<f64> {
      let n: Option<f64> = match self {
        Cell::Number(n) => Some(n),
        Cell::Text(s) => s.trim().parse().ok(),
        Cell::Bool(_) => None,
      };
      n.filter(|n| n.is_finite())
    }
  }

  pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(
      Option::<Cell>::deserialize(d)?
        .map(Cell::into_text)
        .unwrap_or_default(),
    )
  }

  pub fn opt_text<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Option<String>, D::Error> {
    Ok(
      Option::<Cell>::deserialize(d)?
        .map(Cell::into_text)
        .filter(|s| !s.trim().is_empty()),
    )
  }

  /// Blank or unparseable sizes count as 0.
  pub fn household_size<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<u32, D::Error> {
    Ok(
      Option::<Cell>::deserialize(d)?
        .and_then(Cell::into_number)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u32)
        .unwrap_or(0),
    )
  }

  #[derive(Deserialize)]
  #[serde(untagged)]
  enum Methods {
    List(Vec<Option<Cell>>),
    One(Cell),
  }

  /// A method list. A hand-edited cell may hold a comma-joined string
  /// instead of an array; blank or null cells are an empty list.
  pub fn methods<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Vec<String>, D::Error> {
    let labels: Vec<String> = match Option::<Methods>::deserialize(d)? {
      None => Vec::new(),
      Some(Methods::List(cells)) => {
        cells.into_iter().flatten().map(Cell::into_text).collect()
      }
      Some(Methods::One(cell)) => cell
        .into_text()
        .split(',')
        .map(str::to_string)
        .collect(),
    };
    Ok(
      labels
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect(),
    )
  }

  pub fn coordinate<'de, D: Deserializer<'de>>(
    d: D,
  ) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Cell>::deserialize(d)?.and_then(Cell::into_number))
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn valid_draft(name: &str) -> RecordDraft {
    RecordDraft {
      full_name: name.to_string(),
      address: "12/3".to_string(),
      waste_methods: vec![vocab::WASTE_METHODS[0].to_string()],
      water_methods: vec![vocab::WATER_METHODS[0].to_string()],
      ..RecordDraft::default()
    }
  }

  #[test]
  fn default_draft_uses_first_options() {
    let d = RecordDraft::default();
    assert_eq!(d.address_type, vocab::ADDRESS_TYPES[0]);
    assert_eq!(d.household_size, 1);
    assert_eq!(d.lat, Some(vocab::DEFAULT_LAT));
  }

  #[test]
  fn validate_accepts_complete_draft() {
    assert_eq!(valid_draft("Somchai").validate(), Ok(()));
  }

  #[test]
  fn validate_requires_name_and_address() {
    let mut d = valid_draft("   ");
    assert_eq!(d.validate(), Err(ValidationError::MissingField("full name")));
    d.full_name = "Somchai".into();
    d.address = String::new();
    assert_eq!(d.validate(), Err(ValidationError::MissingField("address")));
  }

  #[test]
  fn validate_rejects_empty_method_selections() {
    let mut d = valid_draft("Somchai");
    d.waste_methods.clear();
    assert_eq!(d.validate(), Err(ValidationError::NoWasteMethod));

    let mut d = valid_draft("Somchai");
    d.water_methods.clear();
    assert_eq!(d.validate(), Err(ValidationError::NoWaterMethod));
  }

  #[test]
  fn validate_requires_other_description() {
    let mut d = valid_draft("Somchai");
    d.address_type = vocab::OTHER.into();
    assert_eq!(d.validate(), Err(ValidationError::MissingOtherAddressType));
    d.address_type_other = "วัด".into();
    assert_eq!(d.validate(), Ok(()));
  }

  #[test]
  fn validate_rejects_unknown_community() {
    let mut d = valid_draft("Somchai");
    d.community = "Atlantis".into();
    assert!(matches!(
      d.validate(),
      Err(ValidationError::UnknownOption { field: "community", .. })
    ));
  }

  #[test]
  fn create_mints_identity_and_normalises() {
    let mut d = valid_draft("  Somchai  ");
    d.shop_name = "  ".into();
    d.address_type_other = "ignored".into();
    d.lat = Some(19.30205249);
    d.waste_methods.push(vocab::WASTE_METHODS[0].into());

    let r = Record::create(d, None);
    assert!(Uuid::parse_str(&r.id).is_ok());
    assert!(r.timestamp.ends_with('Z'));
    assert_eq!(r.full_name, "Somchai");
    assert_eq!(r.shop_name, None);
    assert_eq!(r.address_type_other, None);
    assert_eq!(r.lat, Some(19.302052));
    assert_eq!(r.waste_methods.len(), 1);
  }

  #[test]
  fn revise_preserves_identity_and_image() {
    let original = Record::create(valid_draft("A"), Some("https://img/1".into()));
    let mut d = RecordDraft::from_record(&original);
    d.full_name = "B".into();

    let revised = Record::revise(&original, d.clone(), None);
    assert_eq!(revised.id, original.id);
    assert_eq!(revised.timestamp, original.timestamp);
    assert_eq!(revised.full_name, "B");
    assert_eq!(revised.image_url.as_deref(), Some("https://img/1"));

    let replaced = Record::revise(&original, d, Some("https://img/2".into()));
    assert_eq!(replaced.image_url.as_deref(), Some("https://img/2"));
  }

  #[test]
  fn decodes_sheet_values_leniently() {
    let r: Record = serde_json::from_value(json!({
      "id": "r1",
      "timestamp": "2024-01-01T00:00:00.000Z",
      "addressType": "ร้านค้า",
      "addressTypeOther": "",
      "community": "จองคำ",
      "fullName": "Somchai",
      "address": 45,
      "street": "อุดมชาว",
      "phone": 812345678,
      "householdSize": "3",
      "wasteMethods": [],
      "waterMethods": [],
      "responsiblePerson": "สมชาย",
      "imageUrl": "",
      "lat": "",
      "lng": 97.965449
    }))
    .unwrap();

    assert_eq!(r.address, "45");
    assert_eq!(r.phone, "812345678");
    assert_eq!(r.household_size, 3);
    assert_eq!(r.address_type_other, None);
    assert_eq!(r.image_url, None);
    assert_eq!(r.lat, None);
    assert_eq!(r.lng, Some(97.965449));
  }

  #[test]
  fn blank_method_cells_decode_as_empty() {
    let rows: Vec<Record> = serde_json::from_value(json!([
      { "id": "full", "wasteMethods": ["นำไปทำปุ๋ย"], "waterMethods": [] },
      { "id": "blank", "wasteMethods": "", "waterMethods": null },
    ]))
    .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].waste_methods, ["นำไปทำปุ๋ย"]);
    assert!(rows[1].waste_methods.is_empty());
    assert!(rows[1].water_methods.is_empty());
  }

  #[test]
  fn joined_method_cell_is_split() {
    let r: Record = serde_json::from_value(json!({
      "id": "x",
      "wasteMethods": "นำไปทำปุ๋ย, นำไปเป็นอาหารของสัตว์,",
      "waterMethods": ["ปล่อยน้ำเสียลงบ่อเกรอะ", null, " "],
    }))
    .unwrap();
    assert_eq!(r.waste_methods, ["นำไปทำปุ๋ย", "นำไปเป็นอาหารของสัตว์"]);
    assert_eq!(r.water_methods, ["ปล่อยน้ำเสียลงบ่อเกรอะ"]);
  }

  #[test]
  fn blank_household_size_counts_as_zero() {
    let r: Record =
      serde_json::from_value(json!({ "id": "x", "householdSize": "" })).unwrap();
    assert_eq!(r.household_size, 0);
  }

  #[test]
  fn serialises_camel_case_and_skips_absent_optionals() {
    let r = Record::create(valid_draft("Somchai"), None);
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v["fullName"], "Somchai");
    assert_eq!(v["householdSize"], 1);
    assert!(v.get("imageUrl").is_none());
    assert!(v.get("shopName").is_none());
  }

  #[test]
  fn navigation_url_requires_both_coordinates() {
    let mut r = Record::create(valid_draft("A"), None);
    assert_eq!(
      r.navigation_url().as_deref(),
      Some("https://www.google.com/maps/dir/?api=1&destination=19.302052,97.965449")
    );
    r.lng = None;
    assert_eq!(r.navigation_url(), None);
  }

  #[test]
  fn display_address_type_prefers_other_text() {
    let mut d = valid_draft("A");
    d.address_type = vocab::OTHER.into();
    d.address_type_other = "วัด".into();
    let r = Record::create(d, None);
    assert_eq!(r.display_address_type(), "วัด");
  }
}
