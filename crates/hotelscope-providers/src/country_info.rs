use std::io::Cursor;
use std::path::Path;

use hotelscope::{Country, CountryResolver, geo::match_ratio};
use polars::prelude::*;
use tracing::{info, instrument};

use crate::{ProviderConfig, ProviderError, Result, runtime};

pub const COUNTRY_INFO_URL: &str = "https://download.geonames.org/export/dump/countryInfo.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CountryRow {
    alpha_2: String,
    alpha_3: String,
    name: String,
}

impl CountryRow {
    fn to_country(&self) -> Country {
        Country {
            alpha_2: self.alpha_2.clone(),
            name: self.name.clone(),
        }
    }
}

/// In-memory country table parsed from GeoNames `countryInfo.txt`.
///
/// Resolution is case-insensitive: an exact code or name wins, otherwise the closest
/// name containing the query (or contained in it) is returned.
#[derive(Debug, Clone, Default)]
pub struct CountryTable {
    rows: Vec<CountryRow>,
}

/// Column layout of `countryInfo.txt`; the header line is a `#` comment.
const COUNTRY_INFO_SCHEMA: [(PlSmallStr, DataType); 19] = [
    (PlSmallStr::from_static("ISO"), DataType::String),
    (PlSmallStr::from_static("ISO3"), DataType::String),
    (PlSmallStr::from_static("ISO_Numeric"), DataType::Int32),
    (PlSmallStr::from_static("fips"), DataType::String),
    (PlSmallStr::from_static("Country"), DataType::String),
    (PlSmallStr::from_static("Capital"), DataType::String),
    (PlSmallStr::from_static("Area"), DataType::Float64),
    (PlSmallStr::from_static("Population"), DataType::Int64),
    (PlSmallStr::from_static("Continent"), DataType::String),
    (PlSmallStr::from_static("tld"), DataType::String),
    (PlSmallStr::from_static("CurrencyCode"), DataType::String),
    (PlSmallStr::from_static("CurrencyName"), DataType::String),
    (PlSmallStr::from_static("Phone"), DataType::String),
    (PlSmallStr::from_static("Postal_Code_Format"), DataType::String),
    (PlSmallStr::from_static("Postal_Code_Regex"), DataType::String),
    (PlSmallStr::from_static("Languages"), DataType::String),
    (PlSmallStr::from_static("geonameId"), DataType::UInt32),
    (PlSmallStr::from_static("neighbours"), DataType::String),
    (PlSmallStr::from_static("EquivalentFipsCode"), DataType::String),
];

fn read_country_info(bytes: Vec<u8>) -> Result<DataFrame> {
    Ok(CsvReadOptions::default()
        .with_has_header(false)
        .with_schema(Some(Schema::from_iter(COUNTRY_INFO_SCHEMA).into()))
        .map_parse_options(|options| {
            options
                .with_separator(b'\t')
                .with_comment_prefix(Some("#"))
                .with_quote_char(None)
                .with_truncate_ragged_lines(true)
        })
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?)
}

impl CountryTable {
    /// Parses the tab separated GeoNames format. Comment lines start with `#`.
    pub fn parse(text: &str) -> Result<Self> {
        let df = read_country_info(text.as_bytes().to_vec())?;
        let iso = df.column("ISO")?.str()?;
        let iso3 = df.column("ISO3")?.str()?;
        let country = df.column("Country")?.str()?;

        let rows = iso
            .into_iter()
            .zip(iso3)
            .zip(country)
            .enumerate()
            .map(|(row, ((alpha_2, alpha_3), name))| {
                let alpha_2 = alpha_2.map(str::trim).filter(|v| !v.is_empty());
                let name = name.map(str::trim).filter(|v| !v.is_empty());
                match (alpha_2, name) {
                    (Some(alpha_2), Some(name)) => Ok(CountryRow {
                        alpha_2: alpha_2.to_string(),
                        alpha_3: alpha_3.unwrap_or_default().trim().to_string(),
                        name: name.to_string(),
                    }),
                    _ => Err(ProviderError::UnexpectedResponse(format!(
                        "country row {row} has no ISO code or name"
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(&std::fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<Country> {
        let query = name.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        let exact = self.rows.iter().find(|row| {
            row.alpha_2.eq_ignore_ascii_case(&query)
                || row.alpha_3.eq_ignore_ascii_case(&query)
                || row.name.to_lowercase() == query
        });
        if let Some(row) = exact {
            return Some(row.to_country());
        }

        self.rows
            .iter()
            .filter(|row| {
                let candidate = row.name.to_lowercase();
                candidate.contains(&query) || query.contains(&candidate)
            })
            .max_by_key(|row| match_ratio(&row.name, &query))
            .map(CountryRow::to_country)
    }
}

impl CountryResolver for CountryTable {
    fn resolve(&self, name: &str) -> Option<Country> {
        self.lookup(name)
    }
}

/// Downloads and parses `countryInfo.txt` from the configured URL.
#[instrument(name = "Download country info", skip_all, fields(url = %config.country_info_url))]
pub fn download_country_info(config: &ProviderConfig) -> Result<CountryTable> {
    let client = config.http_client()?;
    let text = runtime()?.block_on(async {
        client
            .get(&config.country_info_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    })?;
    let table = CountryTable::parse(&text)?;
    info!(countries = table.len(), "Loaded country table");
    Ok(table)
}
