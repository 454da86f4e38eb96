//! Entry form state: the editable draft plus the raw text of numeric and
//! path fields, which are only parsed on submit.

use std::path::{Path, PathBuf};

use kerb_core::{
  ValidationError,
  record::{Record, RecordDraft},
  store::ImageUpload,
  vocab,
};
use mime_guess::MimeGuess;
use strum::{Display, EnumIter, IntoEnumIterator};

// ─── Fields ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum Field {
  #[strum(to_string = "Full name")]
  FullName,
  #[strum(to_string = "Shop name")]
  ShopName,
  #[strum(to_string = "Household size")]
  HouseholdSize,
  #[strum(to_string = "Phone")]
  Phone,
  #[strum(to_string = "Responsible")]
  Responsible,
  #[strum(to_string = "Address type")]
  AddressType,
  #[strum(to_string = "Other type")]
  AddressTypeOther,
  #[strum(to_string = "Community")]
  Community,
  #[strum(to_string = "Street")]
  Street,
  #[strum(to_string = "Address")]
  Address,
  #[strum(to_string = "Waste methods")]
  WasteMethods,
  #[strum(to_string = "Water methods")]
  WaterMethods,
  #[strum(to_string = "Latitude")]
  Lat,
  #[strum(to_string = "Longitude")]
  Lng,
  #[strum(to_string = "Image file")]
  Image,
}

/// How a field is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  Choice(&'static [&'static str]),
  Multi(&'static [&'static str]),
}

impl Field {
  pub fn kind(self) -> FieldKind {
    match self {
      Self::Responsible => FieldKind::Choice(vocab::RESPONSIBLE_PERSONS),
      Self::AddressType => FieldKind::Choice(vocab::ADDRESS_TYPES),
      Self::Community => FieldKind::Choice(vocab::COMMUNITIES),
      Self::Street => FieldKind::Choice(vocab::STREETS),
      Self::WasteMethods => FieldKind::Multi(vocab::WASTE_METHODS),
      Self::WaterMethods => FieldKind::Multi(vocab::WATER_METHODS),
      _ => FieldKind::Text,
    }
  }
}

// ─── Form ─────────────────────────────────────────────────────────────────────

/// Everything the user has typed so far.
#[derive(Debug, Clone)]
pub struct Form {
  pub draft:         RecordDraft,
  /// The record being edited, or `None` for a new one.
  pub editing:       Option<Record>,
  pub focus:         Field,
  /// Highlighted option inside a multi-select field.
  pub option_cursor: usize,
  pub household:     String,
  pub lat:           String,
  pub lng:           String,
  pub image_path:    String,
}

impl Default for Form {
  fn default() -> Self { Self::from_draft(RecordDraft::default(), None) }
}

impl Form {
  pub fn edit(record: &Record) -> Self {
    Self::from_draft(RecordDraft::from_record(record), Some(record.clone()))
  }

  fn from_draft(draft: RecordDraft, editing: Option<Record>) -> Self {
    Self {
      household: draft.household_size.to_string(),
      lat: draft.lat.map(|v| v.to_string()).unwrap_or_default(),
      lng: draft.lng.map(|v| v.to_string()).unwrap_or_default(),
      image_path: String::new(),
      focus: Field::FullName,
      option_cursor: 0,
      draft,
      editing,
    }
  }

  /// Fields currently shown; the free-text address type only appears for
  /// the "other" sentinel.
  pub fn fields(&self) -> Vec<Field> {
    Field::iter()
      .filter(|f| {
        *f != Field::AddressTypeOther || self.draft.address_type == vocab::OTHER
      })
      .collect()
  }

  // ── Navigation ────────────────────────────────────────────────────────────

  pub fn next_field(&mut self) { self.step_field(1); }

  pub fn prev_field(&mut self) { self.step_field(-1); }

  fn step_field(&mut self, delta: isize) {
    let fields = self.fields();
    let at = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
    let len = fields.len() as isize;
    let next = (at as isize + delta).rem_euclid(len) as usize;
    self.focus = fields[next];
    self.option_cursor = 0;
  }

  /// Left/right: cycle a choice, or move within a multi-select.
  pub fn cycle(&mut self, delta: isize) {
    match self.focus.kind() {
      FieldKind::Choice(options) => {
        let slot = self.choice_slot();
        let at = options.iter().position(|o| *o == slot).unwrap_or(0);
        let next = (at as isize + delta).rem_euclid(options.len() as isize);
        *self.choice_slot_mut() = options[next as usize].to_string();
      }
      FieldKind::Multi(options) => {
        let next = (self.option_cursor as isize + delta)
          .rem_euclid(options.len() as isize);
        self.option_cursor = next as usize;
      }
      FieldKind::Text => {}
    }
  }

  /// Space on a multi-select toggles the highlighted option; elsewhere it
  /// is typed.
  pub fn toggle_or_type_space(&mut self) {
    match self.focus.kind() {
      FieldKind::Multi(options) => {
        let option = options[self.option_cursor].to_string();
        let selected = self.multi_slot_mut();
        if let Some(i) = selected.iter().position(|m| *m == option) {
          selected.remove(i);
        } else {
          selected.push(option);
        }
      }
      _ => self.type_char(' '),
    }
  }

  pub fn type_char(&mut self, c: char) {
    if let Some(buf) = self.text_slot_mut() {
      buf.push(c);
    }
  }

  pub fn backspace(&mut self) {
    if let Some(buf) = self.text_slot_mut() {
      buf.pop();
    }
  }

  // ── Field access ──────────────────────────────────────────────────────────

  /// Display text for `field`.
  pub fn value(&self, field: Field) -> String {
    match field {
      Field::FullName => self.draft.full_name.clone(),
      Field::ShopName => self.draft.shop_name.clone(),
      Field::HouseholdSize => self.household.clone(),
      Field::Phone => self.draft.phone.clone(),
      Field::Responsible => self.draft.responsible_person.clone(),
      Field::AddressType => self.draft.address_type.clone(),
      Field::AddressTypeOther => self.draft.address_type_other.clone(),
      Field::Community => self.draft.community.clone(),
      Field::Street => self.draft.street.clone(),
      Field::Address => self.draft.address.clone(),
      Field::WasteMethods => self.draft.waste_methods.join(", "),
      Field::WaterMethods => self.draft.water_methods.join(", "),
      Field::Lat => self.lat.clone(),
      Field::Lng => self.lng.clone(),
      Field::Image => self.image_path.clone(),
    }
  }

  /// Whether `option` is ticked in the multi-select `field`.
  pub fn is_selected(&self, field: Field, option: &str) -> bool {
    let selected = match field {
      Field::WasteMethods => &self.draft.waste_methods,
      Field::WaterMethods => &self.draft.water_methods,
      _ => return false,
    };
    selected.iter().any(|m| m == option)
  }

  fn text_slot_mut(&mut self) -> Option<&mut String> {
    Some(match self.focus {
      Field::FullName => &mut self.draft.full_name,
      Field::ShopName => &mut self.draft.shop_name,
      Field::HouseholdSize => &mut self.household,
      Field::Phone => &mut self.draft.phone,
      Field::AddressTypeOther => &mut self.draft.address_type_other,
      Field::Address => &mut self.draft.address,
      Field::Lat => &mut self.lat,
      Field::Lng => &mut self.lng,
      Field::Image => &mut self.image_path,
      _ => return None,
    })
  }

  fn choice_slot(&self) -> &str {
    match self.focus {
      Field::Responsible => &self.draft.responsible_person,
      Field::AddressType => &self.draft.address_type,
      Field::Community => &self.draft.community,
      _ => &self.draft.street,
    }
  }

  fn choice_slot_mut(&mut self) -> &mut String {
    match self.focus {
      Field::Responsible => &mut self.draft.responsible_person,
      Field::AddressType => &mut self.draft.address_type,
      Field::Community => &mut self.draft.community,
      _ => &mut self.draft.street,
    }
  }

  fn multi_slot_mut(&mut self) -> &mut Vec<String> {
    match self.focus {
      Field::WaterMethods => &mut self.draft.water_methods,
      _ => &mut self.draft.waste_methods,
    }
  }

  // ── Submission ────────────────────────────────────────────────────────────

  /// Parse the raw text fields into the draft. Returns the draft and the
  /// image path, if one was given.
  pub fn submission(&self) -> Result<(RecordDraft, Option<PathBuf>), ValidationError> {
    let mut draft = self.draft.clone();
    draft.household_size = parse_number::<u32>("household size", &self.household)?
      .ok_or(ValidationError::HouseholdSize)?;
    draft.lat = parse_number("latitude", &self.lat)?;
    draft.lng = parse_number("longitude", &self.lng)?;
    let image = Some(self.image_path.trim())
      .filter(|p| !p.is_empty())
      .map(PathBuf::from);
    Ok((draft, image))
  }
}

/// Blank is `None`; anything else must parse.
fn parse_number<T: std::str::FromStr>(
  field: &'static str,
  raw: &str,
) -> Result<Option<T>, ValidationError> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Ok(None);
  }
  raw
    .parse()
    .map(Some)
    .map_err(|_| ValidationError::InvalidNumber {
      field,
      value: raw.to_string(),
    })
}

// ─── Image loading ────────────────────────────────────────────────────────────

/// MIME type guessed from the file extension.
pub fn mime_for(path: &Path) -> String {
  MimeGuess::from_path(path).first_or_octet_stream().to_string()
}

/// Read an image from disk for upload.
pub async fn load_image(path: &Path) -> Result<ImageUpload, ValidationError> {
  let bytes =
    tokio::fs::read(path)
      .await
      .map_err(|e| ValidationError::Image {
        path:   path.display().to_string(),
        reason: e.to_string(),
      })?;
  let filename = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "image".to_string());
  Ok(ImageUpload {
    bytes,
    mime_type: mime_for(path),
    filename,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn other_type_field_only_for_sentinel() {
    let mut form = Form::default();
    assert!(!form.fields().contains(&Field::AddressTypeOther));
    form.draft.address_type = vocab::OTHER.into();
    assert!(form.fields().contains(&Field::AddressTypeOther));
  }

  #[test]
  fn navigation_wraps_and_skips_hidden_fields() {
    let mut form = Form::default();
    form.focus = Field::AddressType;
    form.next_field();
    assert_eq!(form.focus, Field::Community);
    form.prev_field();
    form.prev_field();
    assert_eq!(form.focus, Field::Responsible);

    form.focus = Field::FullName;
    form.prev_field();
    assert_eq!(form.focus, Field::Image);
  }

  #[test]
  fn choice_cycles_through_options() {
    let mut form = Form::default();
    form.focus = Field::Community;
    form.cycle(1);
    assert_eq!(form.draft.community, vocab::COMMUNITIES[1]);
    form.cycle(-2);
    assert_eq!(form.draft.community, *vocab::COMMUNITIES.last().unwrap());
  }

  #[test]
  fn space_toggles_multi_select() {
    let mut form = Form::default();
    form.focus = Field::WaterMethods;
    form.cycle(1);
    form.toggle_or_type_space();
    assert_eq!(form.draft.water_methods, vec![vocab::WATER_METHODS[1]]);
    assert!(form.is_selected(Field::WaterMethods, vocab::WATER_METHODS[1]));
    form.toggle_or_type_space();
    assert!(form.draft.water_methods.is_empty());
  }

  #[test]
  fn typing_goes_to_text_fields_only() {
    let mut form = Form::default();
    for c in "Ann".chars() {
      form.type_char(c);
    }
    form.toggle_or_type_space();
    form.backspace();
    assert_eq!(form.draft.full_name, "Ann");

    form.focus = Field::Street;
    form.type_char('x');
    assert_eq!(form.draft.street, vocab::STREETS[0]);
  }

  #[test]
  fn submission_parses_numbers() {
    let mut form = Form::default();
    form.household = " 4 ".into();
    form.lat = String::new();
    form.image_path = "  ".into();
    let (draft, image) = form.submission().unwrap();
    assert_eq!(draft.household_size, 4);
    assert_eq!(draft.lat, None);
    assert_eq!(draft.lng, Some(vocab::DEFAULT_LNG));
    assert_eq!(image, None);

    form.household = "four".into();
    assert!(matches!(
      form.submission(),
      Err(ValidationError::InvalidNumber { field: "household size", .. })
    ));
    form.household = String::new();
    assert_eq!(form.submission().unwrap_err(), ValidationError::HouseholdSize);
  }

  #[test]
  fn edit_prefills_from_record() {
    let record = Record::create(
      RecordDraft {
        full_name: "Ann".into(),
        household_size: 5,
        ..RecordDraft::default()
      },
      None,
    );
    let form = Form::edit(&record);
    assert_eq!(form.household, "5");
    assert_eq!(form.editing.as_ref().map(|r| r.id.as_str()), Some(record.id.as_str()));
  }

  #[test]
  fn mime_from_extension() {
    assert_eq!(mime_for(Path::new("a/B.JPG")), "image/jpeg");
    assert_eq!(mime_for(Path::new("x.png")), "image/png");
    assert_eq!(mime_for(Path::new("scan.tiff")), "image/tiff");
    assert_eq!(mime_for(Path::new("plan.svg")), "image/svg+xml");
    assert_eq!(mime_for(Path::new("old.bmp")), "image/bmp");
    assert_eq!(mime_for(Path::new("noext")), "application/octet-stream");
  }

  #[tokio::test]
  async fn missing_image_is_a_validation_error() {
    let err = load_image(Path::new("/definitely/not/here.png"))
      .await
      .unwrap_err();
    assert!(matches!(err, ValidationError::Image { .. }));
  }
}
