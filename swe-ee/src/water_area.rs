/// Monthly permanent-water area query over the JRC Global Surface Water dataset
use crate::{
    error::{EeError, Result},
    expression::{Expression, ExpressionBuilder, ValueNode},
};
use log::warn;
use serde::Deserialize;
use serde_json::{json, Value};
use swe_data::{
    date_range::YEAR_FORMAT, DateRange, MonthlyObservation, Region, TimeSeries,
};

#[cfg(feature = "api")]
use crate::session::Session;
#[cfg(feature = "api")]
use log::info;

/// Monthly History collection, version 1.4.
pub const MONTHLY_HISTORY: &str = "JRC/GSW1_4/MonthlyHistory";

/// Monthly History collection, version 1.3.
pub const MONTHLY_HISTORY_V1_3: &str = "JRC/GSW1_3/MonthlyHistory";

/// Band holding the per-pixel water classification.
pub const WATER_BAND: &str = "water";

/// Classification value for permanent water.
pub const PERMANENT_WATER: i64 = 2;

/// Ground-sample distance of the reduction, in meters.
pub const SCALE_METERS: f64 = 30.0;

/// Pixel budget of the reduction.
pub const MAX_PIXELS: f64 = 1e9;

/// Observations larger than the region by more than this factor are
/// treated as missing.
pub const AREA_TOLERANCE: f64 = 1.05;

const MAPPING_VAR: &str = "_MAPPING_VAR_0_0";

/// Description of the remote computation: for every monthly image whose
/// start time lies in `date_range`, sum the pixel area classified as
/// `water_class` over `region`.
///
/// Building the query does no I/O; [`WaterAreaQuery::to_expression`] only
/// describes the per-image function, which the service evaluates.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterAreaQuery {
    pub collection_id: String,
    pub region: Region,
    pub date_range: DateRange,
    pub water_class: i64,
    pub scale: f64,
    pub max_pixels: f64,
}

#[derive(Debug, Deserialize)]
struct FeatureCollectionResponse {
    #[serde(default)]
    features: Vec<FeatureRecord>,
}

#[derive(Debug, Deserialize)]
struct FeatureRecord {
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    date: String,
    #[serde(default)]
    water_area: Option<f64>,
}

impl WaterAreaQuery {
    pub fn new(region: Region, date_range: DateRange) -> WaterAreaQuery {
        WaterAreaQuery {
            collection_id: MONTHLY_HISTORY.to_string(),
            region,
            date_range,
            water_class: PERMANENT_WATER,
            scale: SCALE_METERS,
            max_pixels: MAX_PIXELS,
        }
    }

    pub fn with_collection(mut self, collection_id: &str) -> WaterAreaQuery {
        self.collection_id = collection_id.to_string();
        self
    }

    fn date(date: &chrono::NaiveDate) -> ValueNode {
        ValueNode::invoke(
            "Date",
            [("value", ValueNode::constant(date.format(YEAR_FORMAT).to_string()))],
        )
    }

    fn geometry(&self) -> ValueNode {
        ValueNode::invoke(
            "GeometryConstructors.MultiPolygon",
            [
                ("coordinates", ValueNode::constant(json!(self.region.coordinates()))),
                ("evenOdd", ValueNode::constant(true)),
            ],
        )
    }

    fn filtered_collection(&self) -> ValueNode {
        let range = ValueNode::invoke(
            "DateRange",
            [
                ("start", Self::date(&self.date_range.start)),
                ("end", Self::date(&self.date_range.end)),
            ],
        );
        ValueNode::invoke(
            "Collection.filter",
            [
                (
                    "collection",
                    ValueNode::invoke(
                        "ImageCollection.load",
                        [("id", ValueNode::constant(self.collection_id.as_str()))],
                    ),
                ),
                (
                    "filter",
                    ValueNode::invoke(
                        "Filter.dateRangeContains",
                        [
                            ("leftValue", range),
                            ("rightField", ValueNode::constant("system:time_start")),
                        ],
                    ),
                ),
            ],
        )
    }

    /// Per-image body: a feature with `date` and `water_area` properties.
    fn per_image_feature(&self) -> ValueNode {
        let image = ValueNode::argument(MAPPING_VAR);
        let water_mask = ValueNode::invoke(
            "Image.eq",
            [
                (
                    "image1",
                    ValueNode::invoke(
                        "Image.select",
                        [
                            ("input", image.clone()),
                            ("bandSelectors", ValueNode::constant(json!([WATER_BAND]))),
                        ],
                    ),
                ),
                (
                    "image2",
                    ValueNode::invoke(
                        "Image.constant",
                        [("value", ValueNode::constant(self.water_class))],
                    ),
                ),
            ],
        );
        let water_area_image = ValueNode::invoke(
            "Image.multiply",
            [
                ("image1", water_mask),
                ("image2", ValueNode::call("Image.pixelArea")),
            ],
        );
        let reduced = ValueNode::invoke(
            "Image.reduceRegion",
            [
                ("image", water_area_image),
                ("reducer", ValueNode::call("Reducer.sum")),
                ("geometry", self.geometry()),
                ("scale", ValueNode::constant(self.scale)),
                ("maxPixels", ValueNode::constant(self.max_pixels)),
            ],
        );
        let water_area = ValueNode::invoke(
            "Dictionary.get",
            [
                ("dictionary", reduced),
                ("key", ValueNode::constant(WATER_BAND)),
            ],
        );
        let date = ValueNode::invoke(
            "Date.format",
            [("date", ValueNode::invoke("Image.date", [("image", image)]))],
        );
        ValueNode::invoke(
            "Feature",
            [
                ("geometry", ValueNode::null()),
                (
                    "metadata",
                    ValueNode::dictionary([("date", date), ("water_area", water_area)]),
                ),
            ],
        )
    }

    /// The full computation as one expression graph.
    pub fn to_expression(&self) -> Expression {
        let mut builder = ExpressionBuilder::new();
        let per_image = builder.function(&[MAPPING_VAR], self.per_image_feature());
        let mapped = ValueNode::invoke(
            "Collection.map",
            [
                ("collection", self.filtered_collection()),
                ("baseAlgorithm", per_image),
            ],
        );
        builder.build(mapped)
    }

    /// Convert a computed feature collection into a series, in service order.
    ///
    /// Observations dated outside the window are dropped, and an area that
    /// is negative or larger than the region allows is kept as missing. The
    /// window admits one image per month, so more observations than months
    /// is an error.
    pub fn parse_response(&self, value: Value) -> Result<TimeSeries> {
        if !value.is_object() {
            return Err(EeError::ResponseShape(format!(
                "expected a feature collection, got {value}"
            )));
        }
        let response: FeatureCollectionResponse = serde_json::from_value(value)?;
        let region_area = self.region.area_m2();
        let mut observations = Vec::with_capacity(response.features.len());
        for feature in response.features {
            let observation =
                MonthlyObservation::parse(&feature.properties.date, feature.properties.water_area)?;
            if !self.date_range.contains(observation.timestamp.date()) {
                warn!(
                    "Dropping observation {} outside {}",
                    observation.timestamp, self.date_range
                );
                continue;
            }
            observations.push(Self::plausible(observation, region_area));
        }

        let months = self.date_range.month_count();
        if observations.len() > months {
            return Err(EeError::ResponseShape(format!(
                "{} observations for {} months in {}",
                observations.len(),
                months,
                self.date_range
            )));
        }
        Ok(TimeSeries::new(observations))
    }

    fn plausible(observation: MonthlyObservation, region_area: f64) -> MonthlyObservation {
        match observation.water_area_m2 {
            Some(area) if area < 0.0 || area > region_area * AREA_TOLERANCE => {
                warn!(
                    "Implausible water area {:.0} m² at {} (region is {:.0} m²); treating as missing",
                    area, observation.timestamp, region_area
                );
                MonthlyObservation::new(observation.timestamp, None)
            }
            _ => observation,
        }
    }

    /// Submit the computation in a single request.
    ///
    /// An empty or inverted date range matches no image, so no request is
    /// made and the series is empty.
    #[cfg(feature = "api")]
    pub async fn request(&self, session: &Session) -> Result<TimeSeries> {
        if self.date_range.is_empty() {
            let kind = if self.date_range.is_inverted() {
                "inverted"
            } else {
                "empty"
            };
            warn!(
                "Date range {} is {}; skipping the remote request",
                self.date_range, kind
            );
            return Ok(TimeSeries::empty());
        }
        info!(
            "Requesting monthly water area from {} for {}",
            self.collection_id, self.date_range
        );
        let value = session.compute_value(&self.to_expression()).await?;
        let series = self.parse_response(value)?;
        info!(
            "Received {} monthly observations ({} without a value)",
            series.len(),
            series.gaps()
        );
        Ok(series)
    }
}
