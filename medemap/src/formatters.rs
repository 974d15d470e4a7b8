use anyhow::Result;
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};

use crate::{transform::cell_text, views::FeatureRecord};

fn to_feature(record: &FeatureRecord) -> geojson::Feature {
    geojson::Feature {
        bbox: None,
        geometry: record
            .geometry
            .map(|point| geojson::Geometry::from(&geo::Geometry::Point(point))),
        id: None,
        properties: Some(record.properties.clone()),
        foreign_members: None,
    }
}

/// Trait to define different output generators. Defines two
/// functions, format which generates a serialized string of the
/// records and save which writes them to a writer
#[enum_dispatch]
pub trait OutputGenerator {
    fn save(&self, writer: &mut impl Write, records: &[FeatureRecord]) -> Result<()>;
    fn format(&self, records: &[FeatureRecord]) -> Result<String> {
        let mut data: Vec<u8> = vec![];
        let mut buff = Cursor::new(&mut data);
        self.save(&mut buff, records)?;

        Ok(String::from_utf8(data)?)
    }
}

/// Enum of OutputFormatters one for each potential
/// output type
#[enum_dispatch(OutputGenerator)]
#[derive(Serialize, Deserialize, Debug)]
pub enum OutputFormatter {
    GeoJSON(GeoJSONFormatter),
    GeoJSONSeq(GeoJSONSeqFormatter),
    Csv(CSVFormatter),
}

/// Format the results as geojson sequence format
/// This is one line per feature serialized as a
/// geojson feature
#[derive(Serialize, Deserialize, Debug)]
pub struct GeoJSONSeqFormatter;

impl OutputGenerator for GeoJSONSeqFormatter {
    fn save(&self, writer: &mut impl Write, records: &[FeatureRecord]) -> Result<()> {
        for record in records {
            writeln!(writer, "{}", to_feature(record))?;
        }
        Ok(())
    }
}

/// Format the results as a geojson feature collection
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct GeoJSONFormatter;

impl OutputGenerator for GeoJSONFormatter {
    fn format(&self, records: &[FeatureRecord]) -> Result<String> {
        let feature_collection = geojson::FeatureCollection {
            bbox: None,
            features: records.iter().map(to_feature).collect(),
            foreign_members: None,
        };
        Ok(feature_collection.to_string())
    }

    fn save(&self, writer: &mut impl Write, records: &[FeatureRecord]) -> Result<()> {
        let result = self.format(records)?;
        writer.write_all(result.as_bytes())?;

        Ok(())
    }
}

/// Format the results as a CSV file. Columns are the union of the
/// record properties in first-seen order, followed by longitude and
/// latitude when any record has a location
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct CSVFormatter;

impl OutputGenerator for CSVFormatter {
    fn save(&self, writer: &mut impl Write, records: &[FeatureRecord]) -> Result<()> {
        let mut headers: Vec<&str> = vec![];
        for record in records {
            for key in record.properties.keys() {
                if !headers.contains(&key.as_str()) {
                    headers.push(key);
                }
            }
        }
        let with_location = records.iter().any(|r| r.geometry.is_some());

        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut header_row: Vec<&str> = headers.clone();
        if with_location {
            header_row.extend(["longitude", "latitude"]);
        }
        csv_writer.write_record(&header_row)?;
        for record in records {
            let mut row: Vec<String> = headers
                .iter()
                .map(|h| cell_text(record.properties.get(*h)))
                .collect();
            if with_location {
                match record.geometry {
                    Some(point) => row.extend([point.x().to_string(), point.y().to_string()]),
                    None => row.extend([String::new(), String::new()]),
                }
            }
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn test_records() -> Vec<FeatureRecord> {
        vec![
            FeatureRecord::new()
                .with("int_val", 2)
                .with("float_val", 2.0)
                .with("str_val", "two")
                .at(geo::Point::new(0.0, 0.0)),
            FeatureRecord::new()
                .with("int_val", 3)
                .with("float_val", 3.0)
                .with("str_val", "three")
                .at(geo::Point::new(20.0, 20.0)),
        ]
    }

    fn expected_features() -> Vec<Value> {
        vec![
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
                "properties": {"int_val": 2, "float_val": 2.0, "str_val": "two"}
            }),
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [20.0, 20.0]},
                "properties": {"int_val": 3, "float_val": 3.0, "str_val": "three"}
            }),
        ]
    }

    #[test]
    fn geojson_formatter_should_work() {
        let formatter = GeoJSONFormatter;
        let output = formatter.format(&test_records());
        assert!(output.is_ok(), "Output should not error");
        let parsed: Value = serde_json::from_str(&output.unwrap()).unwrap();
        assert_eq!(parsed["type"], "FeatureCollection");
        assert_eq!(
            parsed["features"],
            Value::Array(expected_features()),
            "Output should be correct"
        );
    }

    #[test]
    fn geojsonseq_formatter_should_work() {
        let formatter = GeoJSONSeqFormatter;
        let output = formatter.format(&test_records());
        assert!(output.is_ok(), "Output should not error");
        let output = output.unwrap();
        assert!(output.ends_with('\n'), "Every feature ends with a newline");
        let parsed: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(parsed, expected_features(), "Output should be correct");
    }

    #[test]
    fn csv_formatter_should_work() {
        let formatter = CSVFormatter;
        let output = formatter.format(&test_records());
        let correct_str = [
            "int_val,float_val,str_val,longitude,latitude",
            "2,2.0,two,0,0",
            "3,3.0,three,20,20",
            "",
        ]
        .join("\n");

        assert!(output.is_ok(), "Output should not error");
        assert_eq!(output.unwrap(), correct_str, "Output should be correct");
    }

    #[test]
    fn csv_formatter_without_locations_has_no_coordinate_columns() {
        let records = vec![
            FeatureRecord::new().with("country", "Austria").with("value", 1.5),
            FeatureRecord::new().with("country", "Malta").with("extra", true),
        ];
        let output = CSVFormatter.format(&records).unwrap();
        let correct_str = [
            "country,value,extra",
            "Austria,1.5,",
            "Malta,,true",
            "",
        ]
        .join("\n");
        assert_eq!(output, correct_str);
    }
}
