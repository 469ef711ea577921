//! The published dataset index: quadkey to tile file URL.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{IngestError, Result};

/// Where the dataset publishes its tile index.
pub const DATASET_INDEX_URL: &str =
    "https://minedbuildings.z5.web.core.windows.net/global-buildings/dataset-links.csv";

/// Parsed quadkey to URL lookup.
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    urls: HashMap<String, String>,
}

impl DatasetIndex {
    /// Parse the CSV index (`Location,QuadKey,Url,Size`).
    ///
    /// Rows whose quadkey column is not purely digits are ignored, which
    /// covers the header. Several locations can publish the same quadkey;
    /// the first URL wins.
    pub fn parse(csv: &str) -> Result<Self> {
        let mut urls = HashMap::new();

        for (line_no, line) in csv.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split(',');
            let _location = fields.next();
            let quadkey = fields.next().unwrap_or("");
            let url = fields.next().unwrap_or("");

            if quadkey.is_empty() || !quadkey.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if url.is_empty() {
                return Err(IngestError::Index(format!(
                    "row {} has a quadkey but no URL",
                    line_no + 1
                )));
            }

            urls.entry(quadkey.to_string())
                .or_insert_with(|| url.to_string());
        }

        if urls.is_empty() {
            return Err(IngestError::Index(
                "no usable rows in dataset index".to_string(),
            ));
        }

        debug!("Dataset index: {} quadkeys", urls.len());
        Ok(Self { urls })
    }

    /// URL of the tile file for a quadkey, if the dataset covers it.
    pub fn url_for(&self, quadkey: &str) -> Option<&str> {
        self.urls.get(quadkey).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
