//! Built-in locality registry and district adjacency table.
//!
//! Both tables are static, loaded once and never mutated. The adjacency
//! table is hand-authored; bump [`ADJACENCY_VERSION`] whenever it changes.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

use super::types::{GeoPoint, LocalityRecord, PostalCode};

/// Version tag of the district adjacency table.
pub const ADJACENCY_VERSION: u32 = 2;

// ─── Built-in dataset ───────────────────────────────────────────

struct BuiltinLocality {
    city: &'static str,
    district: &'static str,
    region: &'static str,
    state: &'static str,
    lat: f64,
    lon: f64,
    codes: &'static [&'static str],
}

const BUILTIN_LOCALITIES: &[BuiltinLocality] = &[
    BuiltinLocality {
        city: "Ahmedabad", district: "Ahmedabad", region: "Central Gujarat", state: "Gujarat",
        lat: 23.0225, lon: 72.5714,
        codes: &[
            "380001", "380002", "380003", "380004", "380005", "380006", "380007", "380008",
            "380009", "380013", "380015", "380016", "380019", "380022", "380023", "380024",
            "380025", "380026", "380050", "380051", "380052", "380054", "380055",
        ],
    },
    BuiltinLocality {
        city: "Gandhinagar", district: "Ahmedabad", region: "Central Gujarat", state: "Gujarat",
        lat: 23.1890, lon: 72.6280,
        codes: &["382110"],
    },
    BuiltinLocality {
        city: "Viramgam", district: "Ahmedabad", region: "Central Gujarat", state: "Gujarat",
        lat: 23.1200, lon: 72.0300,
        codes: &["382340"],
    },
    BuiltinLocality {
        city: "Gandhinagar", district: "Gandhinagar", region: "Central Gujarat", state: "Gujarat",
        lat: 23.2156, lon: 72.6369,
        codes: &["382001", "382010", "382016", "382020", "382030"],
    },
    BuiltinLocality {
        city: "Kadi", district: "Gandhinagar", region: "North Gujarat", state: "Gujarat",
        lat: 23.2990, lon: 72.3320,
        codes: &["382150"],
    },
    BuiltinLocality {
        city: "Surat", district: "Surat", region: "South Gujarat", state: "Gujarat",
        lat: 21.1702, lon: 72.8311,
        codes: &[
            "395001", "395002", "395003", "395004", "395005", "395006", "395007", "395009",
            "395010", "395017", "395023",
        ],
    },
    BuiltinLocality {
        city: "Vadodara", district: "Vadodara", region: "Central Gujarat", state: "Gujarat",
        lat: 22.3072, lon: 73.1812,
        codes: &[
            "390001", "390002", "390004", "390005", "390007", "390008", "390009", "390011",
            "390021",
        ],
    },
    BuiltinLocality {
        city: "Anand", district: "Vadodara", region: "Central Gujarat", state: "Gujarat",
        lat: 22.5585, lon: 72.9350,
        codes: &["391740", "391760", "388001", "388002"],
    },
    BuiltinLocality {
        city: "Nadiad", district: "Kheda", region: "Central Gujarat", state: "Gujarat",
        lat: 22.6916, lon: 72.8634,
        codes: &["387001", "387002"],
    },
    BuiltinLocality {
        city: "Rajkot", district: "Rajkot", region: "Saurashtra", state: "Gujarat",
        lat: 22.3039, lon: 70.8022,
        codes: &["360001", "360002", "360003", "360004", "360005", "360006", "360010"],
    },
    BuiltinLocality {
        city: "Morbi", district: "Rajkot", region: "Saurashtra", state: "Gujarat",
        lat: 22.8174, lon: 70.8237,
        codes: &["360560", "363641", "363642"],
    },
    BuiltinLocality {
        city: "Jamnagar", district: "Jamnagar", region: "Saurashtra", state: "Gujarat",
        lat: 22.4707, lon: 70.0577,
        codes: &["361001", "361002", "361003", "361005", "361006", "361008"],
    },
    BuiltinLocality {
        city: "Bhavnagar", district: "Bhavnagar", region: "Saurashtra", state: "Gujarat",
        lat: 21.7645, lon: 72.1519,
        codes: &["364001", "364002", "364003", "364004", "364005"],
    },
    BuiltinLocality {
        city: "Junagadh", district: "Junagadh", region: "Saurashtra", state: "Gujarat",
        lat: 21.5222, lon: 70.4579,
        codes: &["362001", "362002", "362010"],
    },
    BuiltinLocality {
        city: "Porbandar", district: "Porbandar", region: "Saurashtra", state: "Gujarat",
        lat: 21.6417, lon: 69.6293,
        codes: &["360575", "360576"],
    },
    BuiltinLocality {
        city: "Amreli", district: "Amreli", region: "Saurashtra", state: "Gujarat",
        lat: 21.6032, lon: 71.2221,
        codes: &["365601", "365602"],
    },
    BuiltinLocality {
        city: "Mehsana", district: "Mehsana", region: "North Gujarat", state: "Gujarat",
        lat: 23.5880, lon: 72.3693,
        codes: &["384001", "384002", "384003", "384004"],
    },
    BuiltinLocality {
        city: "Patan", district: "Patan", region: "North Gujarat", state: "Gujarat",
        lat: 23.8493, lon: 72.1266,
        codes: &["384265", "384266"],
    },
    BuiltinLocality {
        city: "Palanpur", district: "Banaskantha", region: "North Gujarat", state: "Gujarat",
        lat: 24.1724, lon: 72.4346,
        codes: &["385001", "385002"],
    },
    BuiltinLocality {
        city: "Navsari", district: "Navsari", region: "South Gujarat", state: "Gujarat",
        lat: 20.9467, lon: 72.9520,
        codes: &["396445", "396446", "396521"],
    },
    BuiltinLocality {
        city: "Vapi", district: "Valsad", region: "South Gujarat", state: "Gujarat",
        lat: 20.3893, lon: 72.9106,
        codes: &["396191", "396195"],
    },
    BuiltinLocality {
        city: "Bharuch", district: "Bharuch", region: "South Gujarat", state: "Gujarat",
        lat: 21.7051, lon: 72.9959,
        codes: &["392001", "392002"],
    },
    BuiltinLocality {
        city: "Godhra", district: "Panchmahal", region: "Central Gujarat", state: "Gujarat",
        lat: 22.7788, lon: 73.6143,
        codes: &["389001", "389002"],
    },
    BuiltinLocality {
        city: "Dahod", district: "Dahod", region: "Central Gujarat", state: "Gujarat",
        lat: 22.8350, lon: 74.2550,
        codes: &["389151", "389152"],
    },
    // Outside the service state; resolvable so callers can name the place.
    BuiltinLocality {
        city: "Mumbai", district: "Mumbai", region: "Konkan", state: "Maharashtra",
        lat: 18.9388, lon: 72.8354,
        codes: &["400001", "400050"],
    },
    BuiltinLocality {
        city: "Pune", district: "Pune", region: "Desh", state: "Maharashtra",
        lat: 18.5204, lon: 73.8567,
        codes: &["411001"],
    },
    BuiltinLocality {
        city: "Udaipur", district: "Udaipur", region: "Mewar", state: "Rajasthan",
        lat: 24.5854, lon: 73.7125,
        codes: &["313001"],
    },
    BuiltinLocality {
        city: "Jaipur", district: "Jaipur", region: "Dhundhar", state: "Rajasthan",
        lat: 26.9124, lon: 75.7873,
        codes: &["302001"],
    },
    BuiltinLocality {
        city: "New Delhi", district: "New Delhi", region: "National Capital Territory", state: "Delhi",
        lat: 28.6139, lon: 77.2090,
        codes: &["110001"],
    },
];

/// District name → suggested service cities.
const DISTRICT_ADJACENCY: &[(&str, &[&str])] = &[
    ("Ahmedabad", &["Ahmedabad", "Gandhinagar", "Anand"]),
    ("Gandhinagar", &["Gandhinagar", "Ahmedabad"]),
    ("Surat", &["Surat", "Navsari", "Vapi"]),
    ("Vadodara", &["Vadodara", "Anand"]),
    ("Kheda", &["Nadiad", "Anand", "Ahmedabad"]),
    ("Rajkot", &["Rajkot", "Morbi", "Jamnagar"]),
    ("Jamnagar", &["Jamnagar", "Rajkot"]),
    ("Bhavnagar", &["Bhavnagar"]),
    ("Junagadh", &["Junagadh"]),
    ("Mehsana", &["Mehsana", "Palanpur"]),
    ("Navsari", &["Navsari", "Vapi", "Surat"]),
    ("Valsad", &["Vapi"]),
    ("Porbandar", &["Porbandar"]),
    ("Amreli", &["Amreli"]),
    ("Patan", &["Patan"]),
    ("Banaskantha", &["Palanpur"]),
    ("Panchmahal", &["Godhra"]),
    ("Bharuch", &["Bharuch"]),
    ("Dahod", &["Dahod"]),
];

/// A city entry for listings. Coordinates are absent when the record has none.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CityInfo {
    pub name: String,
    pub district: String,
    pub region: String,
    pub state: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl CityInfo {
    pub fn point(&self) -> Option<GeoPoint> {
        GeoPoint::from_parts(self.lat, self.lon)
    }
}

impl From<&LocalityRecord> for CityInfo {
    fn from(r: &LocalityRecord) -> Self {
        Self {
            name: r.city_name.clone(),
            district: r.district_name.clone(),
            region: r.region_name.clone(),
            state: r.state_name.clone(),
            lat: r.latitude,
            lon: r.longitude,
        }
    }
}

/// Home-district record first, then the lowest pincode.
fn home_first(a: &LocalityRecord, b: &LocalityRecord) -> Ordering {
    let a_away = !a.district_name.eq_ignore_ascii_case(&a.city_name);
    let b_away = !b.district_name.eq_ignore_ascii_case(&b.city_name);
    a_away.cmp(&b_away).then_with(|| a.code.cmp(&b.code))
}

/// Read-only mapping of pincode to locality plus the adjacency table.
#[derive(Debug)]
pub struct LocalityRegistry {
    by_code: HashMap<PostalCode, LocalityRecord>,
    adjacency: HashMap<String, Vec<String>>,
}

impl LocalityRegistry {
    /// The process-wide built-in registry, built on first use.
    pub fn builtin() -> Arc<LocalityRegistry> {
        static REGISTRY: OnceLock<Arc<LocalityRegistry>> = OnceLock::new();
        REGISTRY
            .get_or_init(|| Arc::new(Self::from_builtin_tables()))
            .clone()
    }

    fn from_builtin_tables() -> Self {
        let records = BUILTIN_LOCALITIES.iter().flat_map(|loc| {
            loc.codes.iter().filter_map(move |code| {
                Some(LocalityRecord {
                    code: PostalCode::parse(code)?,
                    city_name: loc.city.to_string(),
                    district_name: loc.district.to_string(),
                    region_name: loc.region.to_string(),
                    state_name: loc.state.to_string(),
                    latitude: Some(loc.lat),
                    longitude: Some(loc.lon),
                })
            })
        });
        let adjacency = DISTRICT_ADJACENCY
            .iter()
            .map(|(district, cities)| {
                (district.to_string(), cities.iter().map(|c| c.to_string()).collect())
            })
            .collect();
        Self::from_records(records, adjacency)
    }

    /// Build a registry from explicit records and adjacency entries.
    /// A later record with an already-seen code is ignored.
    pub fn from_records(
        records: impl IntoIterator<Item = LocalityRecord>,
        adjacency: HashMap<String, Vec<String>>,
    ) -> Self {
        let mut by_code = HashMap::new();
        for record in records {
            by_code.entry(record.code.clone()).or_insert(record);
        }
        Self { by_code, adjacency }
    }

    /// Exact lookup; no prefix or fuzzy matching.
    pub fn lookup(&self, code: &PostalCode) -> Option<&LocalityRecord> {
        self.by_code.get(code)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Cities suggested for a district, if the table has an entry.
    pub fn adjacent_cities(&self, district: &str) -> Option<&[String]> {
        self.adjacency.get(district).map(Vec::as_slice)
    }

    /// Case-insensitive exact city-name match. When a city spans several
    /// districts, the record whose district carries the city's name wins,
    /// then the lowest pincode.
    pub fn find_city(&self, name: &str) -> Option<&LocalityRecord> {
        let q = name.trim();
        if q.is_empty() {
            return None;
        }
        self.by_code
            .values()
            .filter(|r| r.city_name.eq_ignore_ascii_case(q))
            .min_by(|a, b| home_first(a, b))
    }

    /// Resolve either a well-formed pincode or a city name.
    pub fn resolve_place(&self, city_or_code: &str) -> Option<&LocalityRecord> {
        match PostalCode::parse(city_or_code) {
            Some(code) => self.lookup(&code),
            None => self.find_city(city_or_code),
        }
    }

    /// Coordinates for a city-or-code string.
    pub fn point_of(&self, city_or_code: &str) -> Option<GeoPoint> {
        self.resolve_place(city_or_code).and_then(LocalityRecord::point)
    }

    /// "City, District, State", or "Unknown" for an unresolvable code.
    pub fn format_location(&self, raw: &str) -> String {
        PostalCode::parse(raw)
            .and_then(|code| self.lookup(&code))
            .map(LocalityRecord::display_line)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// One entry per (city, district), sorted by city then district.
    pub fn city_list(&self) -> Vec<CityInfo> {
        let mut seen: HashMap<(&str, &str), &LocalityRecord> = HashMap::new();
        for record in self.by_code.values() {
            seen.entry((record.city_name.as_str(), record.district_name.as_str()))
                .and_modify(|cur| {
                    if record.code < cur.code {
                        *cur = record;
                    }
                })
                .or_insert(record);
        }
        let mut cities: Vec<CityInfo> = seen.into_values().map(CityInfo::from).collect();
        cities.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.district.cmp(&b.district)));
        cities
    }

    /// Cities in a region (case-insensitive), one entry per city name,
    /// sorted by name. A city spanning districts is listed at its home district.
    pub fn localities_in_region(&self, region: &str) -> Vec<CityInfo> {
        let region = region.trim();
        let mut best: BTreeMap<&str, &LocalityRecord> = BTreeMap::new();
        for record in self
            .by_code
            .values()
            .filter(|r| r.region_name.eq_ignore_ascii_case(region))
        {
            best.entry(record.city_name.as_str())
                .and_modify(|cur| {
                    if home_first(record, cur).is_lt() {
                        *cur = record;
                    }
                })
                .or_insert(record);
        }
        best.into_values().map(CityInfo::from).collect()
    }

    /// All region names, sorted and deduplicated.
    pub fn regions(&self) -> Vec<String> {
        self.by_code
            .values()
            .map(|r| r.region_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// City names within `state`, sorted and deduplicated.
    pub fn covered_cities(&self, state: &str) -> Vec<String> {
        self.by_code
            .values()
            .filter(|r| r.state_name == state)
            .map(|r| r.city_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// District names within `state`, sorted and deduplicated.
    pub fn covered_districts(&self, state: &str) -> Vec<String> {
        self.by_code
            .values()
            .filter(|r| r.state_name == state)
            .map(|r| r.district_name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
