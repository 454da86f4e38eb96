//! Search and "load more" pagination over a record snapshot.

use crate::record::Record;

/// Rows revealed per "load more".
pub const PAGE_SIZE: usize = 20;

/// Hard ceiling on revealed rows, whatever the filtered total.
pub const MAX_REVEALED: usize = 100;

/// Records whose full name, community, street or responsible person
/// contains `query`, compared case-insensitively. Input order is kept; an
/// empty query matches everything.
pub fn filter<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
  let needle = query.to_lowercase();
  if needle.is_empty() {
    return records.iter().collect();
  }
  records
    .iter()
    .filter(|r| {
      [&r.full_name, &r.community, &r.street, &r.responsible_person]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    })
    .collect()
}

/// A revealed prefix of a filtered list.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
  pub items:     &'a [T],
  /// Filtered rows not yet revealed.
  pub remaining: usize,
}

/// Reveal `page_size` more rows beyond `already_shown`, never exceeding
/// [`MAX_REVEALED`] in total. Past the cap this returns the same slice.
pub fn paginate<T>(
  filtered: &[T],
  page_size: usize,
  already_shown: usize,
) -> Page<'_, T> {
  let revealed = already_shown
    .saturating_add(page_size)
    .min(MAX_REVEALED)
    .min(filtered.len());
  Page {
    items:     &filtered[..revealed],
    remaining: filtered.len() - revealed,
  }
}

/// Per-view pagination state. The first page is visible without asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
  shown: usize,
}

impl Default for Pager {
  fn default() -> Self { Self { shown: PAGE_SIZE } }
}

impl Pager {
  /// Rows currently revealed out of `total` filtered rows.
  pub fn visible(&self, total: usize) -> usize { self.shown.min(total) }

  pub fn page<'a, T>(&self, filtered: &'a [T]) -> Page<'a, T> {
    paginate(filtered, 0, self.shown)
  }

  /// Whether "load more" would reveal anything.
  pub fn can_load_more(&self, total: usize) -> bool {
    self.shown < total && self.shown < MAX_REVEALED
  }

  pub fn load_more(&mut self) {
    self.shown = (self.shown + PAGE_SIZE).min(MAX_REVEALED);
  }

  /// Back to the first page, e.g. after the query changes.
  pub fn reset(&mut self) { *self = Self::default(); }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vocab;

  fn row(name: &str, community: &str) -> Record {
    Record {
      id:                 name.to_string(),
      timestamp:          String::new(),
      address_type:       vocab::ADDRESS_TYPES[0].to_string(),
      address_type_other: None,
      community:          community.to_string(),
      full_name:          name.to_string(),
      shop_name:          Some("Hidden Shop".to_string()),
      address:            "Somewhere".to_string(),
      street:             vocab::STREETS[0].to_string(),
      phone:              "0812345678".to_string(),
      household_size:     1,
      waste_methods:      Vec::new(),
      water_methods:      Vec::new(),
      responsible_person: vocab::RESPONSIBLE_PERSONS[0].to_string(),
      image_url:          None,
      lat:                None,
      lng:                None,
    }
  }

  fn rows(n: usize) -> Vec<Record> {
    (0..n).map(|i| row(&format!("r{i}"), "c")).collect()
  }

  #[test]
  fn empty_query_returns_everything_in_order() {
    let rs = vec![row("b", "x"), row("a", "y"), row("c", "z")];
    let out = filter(&rs, "");
    assert_eq!(out.len(), 3);
    assert!(out.iter().zip(&rs).all(|(a, b)| a.id == b.id));
  }

  #[test]
  fn filter_is_case_insensitive() {
    let rs = vec![row("Abc Def", "x"), row("xyz", "ABCville"), row("none", "q")];
    let upper: Vec<_> = filter(&rs, "ABC").iter().map(|r| &r.id).collect();
    let lower: Vec<_> = filter(&rs, "abc").iter().map(|r| &r.id).collect();
    assert_eq!(upper, lower);
    assert_eq!(upper.len(), 2);
  }

  #[test]
  fn filter_ignores_fields_outside_the_search_set() {
    let rs = vec![row("a", "x")];
    assert!(filter(&rs, "hidden").is_empty());
    assert!(filter(&rs, "0812").is_empty());
    assert_eq!(filter(&rs, "ขุนลุม").len(), 1);
  }

  #[test]
  fn filter_keeps_relative_order() {
    let rs = vec![row("anna", "x"), row("bob", "x"), row("hannah", "x")];
    let ids: Vec<_> = filter(&rs, "ann").iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["anna", "hannah"]);
  }

  #[test]
  fn paginate_reveals_page_size_more() {
    let rs = rows(50);
    let p = paginate(&rs, PAGE_SIZE, 0);
    assert_eq!(p.items.len(), 20);
    assert_eq!(p.remaining, 30);
    let p = paginate(&rs, PAGE_SIZE, 40);
    assert_eq!(p.items.len(), 50);
    assert_eq!(p.remaining, 0);
  }

  #[test]
  fn paginate_never_passes_the_cap() {
    let rs = rows(250);
    let mut shown = 0;
    for _ in 0..20 {
      let p = paginate(&rs, PAGE_SIZE, shown);
      assert!(p.items.len() <= MAX_REVEALED);
      shown = p.items.len();
    }
    assert_eq!(shown, MAX_REVEALED);
    let again = paginate(&rs, PAGE_SIZE, shown);
    assert_eq!(again.items.len(), MAX_REVEALED);
    assert_eq!(again.remaining, 150);
  }

  #[test]
  fn pager_starts_with_one_page_and_stops_at_cap() {
    let mut pager = Pager::default();
    assert_eq!(pager.visible(250), 20);
    assert!(pager.can_load_more(250));
    for _ in 0..10 {
      pager.load_more();
    }
    assert_eq!(pager.visible(250), MAX_REVEALED);
    assert!(!pager.can_load_more(250));
    assert_eq!(pager.page(&rows(250)).items.len(), MAX_REVEALED);

    pager.reset();
    assert_eq!(pager.visible(5), 5);
    assert!(!pager.can_load_more(5));
  }
}
