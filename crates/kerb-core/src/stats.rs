//! Derived statistics over a record snapshot.
//!
//! Waste and water methods are classified by different rules on purpose:
//! a waste method label is tested against every bucket independently (one
//! label may land in several), while a water method label goes to the first
//! matching category only.

use std::collections::BTreeMap;

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::record::Record;

// ─── Waste buckets ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum WasteBucket {
  #[strum(to_string = "Green bag")]
  GreenBag,
  #[strum(to_string = "Wet-waste bin")]
  WetBin,
  #[strum(to_string = "Animal feed")]
  AnimalFeed,
  #[strum(to_string = "Compost")]
  Compost,
}

impl WasteBucket {
  /// Whether `method` counts towards this bucket. The first two are
  /// substring markers, the last two exact labels.
  pub fn matches(self, method: &str) -> bool {
    match self {
      Self::GreenBag => method.contains("ถุงเขียว"),
      Self::WetBin => method.contains("ถังขยะเปียก"),
      Self::AnimalFeed => method == "นำไปเป็นอาหารของสัตว์",
      Self::Compost => method == "นำไปทำปุ๋ย",
    }
  }

  /// Every bucket `method` counts towards, possibly none.
  pub fn classify(method: &str) -> impl Iterator<Item = WasteBucket> + '_ {
    Self::iter().filter(move |b| b.matches(method))
  }
}

// ─── Water categories ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum WaterCategory {
  #[strum(to_string = "Grease trap installed")]
  TrapInstalled,
  #[strum(to_string = "Awaiting grease trap")]
  TrapPending,
  #[strum(to_string = "Private land")]
  PrivateLand,
  #[strum(to_string = "Septic tank")]
  SepticTank,
  #[strum(to_string = "Public drain")]
  PublicDrain,
}

/// How a water method reads at a glance in the tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
  Good,
  Pending,
  Poor,
  Neutral,
}

impl WaterCategory {
  fn marker(self) -> &'static str {
    match self {
      Self::TrapInstalled => "มีการติดตั้ง",
      Self::TrapPending => "รอการติดตั้ง",
      Self::PrivateLand => "พื้นที่ส่วนตัว",
      Self::SepticTank => "บ่อเกรอะ",
      Self::PublicDrain => "ท่อระบายน้ำสาธารณะ",
    }
  }

  /// First category (in declaration order) whose marker `method` contains.
  pub fn classify(method: &str) -> Option<WaterCategory> {
    Self::iter().find(|c| method.contains(c.marker()))
  }

  pub fn tone(self) -> Tone {
    match self {
      Self::TrapInstalled | Self::PrivateLand | Self::SepticTank => Tone::Good,
      Self::TrapPending => Tone::Pending,
      Self::PublicDrain => Tone::Poor,
    }
  }

  /// Tone for an arbitrary method label; unmatched labels are neutral.
  pub fn tone_of(method: &str) -> Tone {
    Self::classify(method).map_or(Tone::Neutral, Self::tone)
  }
}

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Aggregates for one snapshot. Recomputed from scratch on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
  pub total:                  usize,
  /// Counts in [`WasteBucket::iter`] order.
  pub waste:                  Vec<(WasteBucket, usize)>,
  /// Counts in [`WaterCategory::iter`] order.
  pub water:                  Vec<(WaterCategory, usize)>,
  pub responsible:            BTreeMap<String, usize>,
  /// Mean household size rounded to one decimal; 0 for no records.
  pub average_household_size: f64,
}

impl Statistics {
  pub fn waste_count(&self, bucket: WasteBucket) -> usize {
    self
      .waste
      .iter()
      .find_map(|(b, n)| (*b == bucket).then_some(*n))
      .unwrap_or(0)
  }

  pub fn water_count(&self, category: WaterCategory) -> usize {
    self
      .water
      .iter()
      .find_map(|(c, n)| (*c == category).then_some(*n))
      .unwrap_or(0)
  }

  /// Sum over all waste buckets (a method label counted in two buckets
  /// contributes twice).
  pub fn waste_method_total(&self) -> usize {
    self.waste.iter().map(|(_, n)| n).sum()
  }
}

pub fn compute_statistics(records: &[Record]) -> Statistics {
  let mut waste: Vec<(WasteBucket, usize)> =
    WasteBucket::iter().map(|b| (b, 0)).collect();
  let mut water: Vec<(WaterCategory, usize)> =
    WaterCategory::iter().map(|c| (c, 0)).collect();
  let mut responsible = BTreeMap::new();
  let mut household_total: u64 = 0;

  for record in records {
    for method in &record.waste_methods {
      for (bucket, count) in waste.iter_mut() {
        if bucket.matches(method) {
          *count += 1;
        }
      }
    }
    for method in &record.water_methods {
      if let Some(category) = WaterCategory::classify(method)
        && let Some((_, count)) = water.iter_mut().find(|(c, _)| *c == category)
      {
        *count += 1;
      }
    }
    *responsible
      .entry(record.responsible_person.clone())
      .or_insert(0) += 1;
    household_total += u64::from(record.household_size);
  }

  Statistics {
    total: records.len(),
    waste,
    water,
    responsible,
    average_household_size: average_one_decimal(household_total, records.len()),
  }
}

fn average_one_decimal(sum: u64, count: usize) -> f64 {
  if count == 0 {
    return 0.0;
  }
  let mean = sum as f64 / count as f64;
  (mean * 10.0).round() / 10.0
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::vocab;

  fn record(name: &str, size: u32, waste: &[&str], water: &[&str]) -> Record {
    Record {
      id:                 name.to_string(),
      timestamp:          String::new(),
      address_type:       vocab::ADDRESS_TYPES[0].to_string(),
      address_type_other: None,
      community:          vocab::COMMUNITIES[0].to_string(),
      full_name:          name.to_string(),
      shop_name:          None,
      address:            "1".to_string(),
      street:             vocab::STREETS[0].to_string(),
      phone:              String::new(),
      household_size:     size,
      waste_methods:      waste.iter().map(|s| s.to_string()).collect(),
      water_methods:      water.iter().map(|s| s.to_string()).collect(),
      responsible_person: vocab::RESPONSIBLE_PERSONS[0].to_string(),
      image_url:          None,
      lat:                None,
      lng:                None,
    }
  }

  #[test]
  fn average_of_two_records() {
    let rs = [record("A", 2, &[], &[]), record("B", 4, &[], &[])];
    assert_eq!(compute_statistics(&rs).average_household_size, 3.0);
  }

  #[test]
  fn average_rounds_to_one_decimal() {
    let rs = [
      record("A", 1, &[], &[]),
      record("B", 2, &[], &[]),
      record("C", 2, &[], &[]),
    ];
    // 5 / 3 = 1.666…
    assert_eq!(compute_statistics(&rs).average_household_size, 1.7);
  }

  #[test]
  fn empty_set_reports_zero() {
    let stats = compute_statistics(&[]);
    assert_eq!(stats.total, 0);
    assert_eq!(stats.average_household_size, 0.0);
    assert_eq!(stats.waste_method_total(), 0);
    assert!(stats.responsible.is_empty());
  }

  #[test]
  fn waste_label_may_hit_several_buckets() {
    let combined = "ใช้ถุงเขียวร่วมกับถังขยะเปียก";
    let hits: Vec<_> = WasteBucket::classify(combined).collect();
    assert_eq!(hits, vec![WasteBucket::GreenBag, WasteBucket::WetBin]);

    let rs = [record("A", 1, &[combined, "นำไปทำปุ๋ย"], &[])];
    let stats = compute_statistics(&rs);
    assert_eq!(stats.waste_count(WasteBucket::GreenBag), 1);
    assert_eq!(stats.waste_count(WasteBucket::WetBin), 1);
    assert_eq!(stats.waste_count(WasteBucket::Compost), 1);
    assert_eq!(stats.waste_count(WasteBucket::AnimalFeed), 0);
    assert_eq!(stats.waste_method_total(), 3);
  }

  #[test]
  fn exact_waste_labels_do_not_match_substrings() {
    assert!(!WasteBucket::Compost.matches("นำไปทำปุ๋ยหมัก"));
    assert!(WasteBucket::Compost.matches("นำไปทำปุ๋ย"));
  }

  #[test]
  fn water_label_goes_to_first_match_only() {
    // Contains both the installed marker and the public drain marker.
    let label = "มีการติดตั้งบ่อดักก่อนลงท่อระบายน้ำสาธารณะ";
    assert_eq!(
      WaterCategory::classify(label),
      Some(WaterCategory::TrapInstalled)
    );

    let rs = [record("A", 1, &[], &[label, "ไม่ทราบ"])];
    let stats = compute_statistics(&rs);
    assert_eq!(stats.water_count(WaterCategory::TrapInstalled), 1);
    assert_eq!(stats.water_count(WaterCategory::PublicDrain), 0);
    assert_eq!(stats.water.iter().map(|(_, n)| n).sum::<usize>(), 1);
  }

  #[test]
  fn every_vocabulary_water_method_has_a_category() {
    for m in vocab::WATER_METHODS {
      assert!(WaterCategory::classify(m).is_some(), "{m}");
    }
  }

  #[test]
  fn water_tones() {
    assert_eq!(WaterCategory::tone_of(vocab::WATER_METHODS[0]), Tone::Good);
    assert_eq!(WaterCategory::tone_of(vocab::WATER_METHODS[1]), Tone::Pending);
    assert_eq!(WaterCategory::tone_of(vocab::WATER_METHODS[4]), Tone::Poor);
    assert_eq!(WaterCategory::tone_of("อื่น"), Tone::Neutral);
  }

  #[test]
  fn responsible_counts_group_by_person() {
    let mut a = record("A", 1, &[], &[]);
    let mut b = record("B", 1, &[], &[]);
    let c = record("C", 1, &[], &[]);
    a.responsible_person = "x".into();
    b.responsible_person = "x".into();
    let stats = compute_statistics(&[a, b, c]);
    assert_eq!(stats.responsible.get("x"), Some(&2));
    assert_eq!(stats.responsible.get(vocab::RESPONSIBLE_PERSONS[0]), Some(&1));
  }
}
