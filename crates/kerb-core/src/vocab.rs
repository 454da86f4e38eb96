//! Fixed option lists offered by the survey form.
//!
//! Records store the Thai labels verbatim; the statistics classifiers match
//! on substrings of these labels, so editing a label here can move records
//! between buckets.

/// Sentinel address type that unlocks the free-text `addressTypeOther` field.
pub const OTHER: &str = "อื่นๆ";

pub const ADDRESS_TYPES: &[&str] = &[
  "บ้านพักอาศัย",
  "ร้านค้า",
  "ร้านอาหาร",
  "สถานประกอบการ",
  "หน่วยงานราชการ",
  OTHER,
];

pub const COMMUNITIES: &[&str] = &[
  "จองคำ",
  "จองกลาง",
  "ดอยคำ",
  "ปางล้อ",
  "ผาบ่อง",
  "ไม้แงะ",
  "หนองเขียว",
  "นาป่าแปก",
];

pub const STREETS: &[&str] = &[
  "ขุนลุมประพาส",
  "สิงหนาทบำรุง",
  "ประดิษฐ์จองคำ",
  "นิเวศน์พิศาล",
  "มรรคสันติ",
  "อุดมชาว",
  "ผดุงม่วยต่อ",
];

pub const WASTE_METHODS: &[&str] = &[
  "แยกเศษอาหารใส่ถุงเขียว",
  "ทิ้งเศษอาหารลงถังขยะเปียก",
  "ใช้ถุงเขียวร่วมกับถังขยะเปียก",
  "นำไปเป็นอาหารของสัตว์",
  "นำไปทำปุ๋ย",
];

pub const WATER_METHODS: &[&str] = &[
  "มีการติดตั้งบ่อดักไขมัน",
  "รอการติดตั้งบ่อดักไขมัน",
  "ปล่อยน้ำเสียลงพื้นที่ส่วนตัว",
  "ปล่อยน้ำเสียลงบ่อเกรอะ",
  "ปล่อยน้ำเสียลงท่อระบายน้ำสาธารณะ",
];

pub const RESPONSIBLE_PERSONS: &[&str] = &[
  "สมชาย",
  "สมศรี",
  "วิไลวรรณ",
  "ประเสริฐ",
  "อรุณี",
];

/// Map pin placed on a fresh form (municipal office).
pub const DEFAULT_LAT: f64 = 19.302052;
pub const DEFAULT_LNG: f64 = 97.965449;

/// Returns `true` when `value` is one of `options`.
pub fn allows(options: &[&str], value: &str) -> bool {
  options.contains(&value)
}
