//! SQL plan construction for one acquisition

use gpq_core::error::Result;
use gpq_core::models::{
    AreaOfInterest, BoundingBox, Column, ExportPlan, MaterializePlan, OutputFormat, OutputTarget,
    Predicate, QuerySpec, SamplePlan, SourceProfile,
};
use gpq_core::sql::{quote_identifier, quote_literal};
use gpq_geo::{bbox_wkt, reproject_aoi};

/// Intermediate table every job materializes into
pub const INTERMEDIATE_TABLE: &str = "download_data";

/// Unsigned types some GIS drivers reject
const NARROW_UNSIGNED_TYPES: [&str; 2] = ["UTINYINT", "USMALLINT"];

/// Builds the materialize, sample and export plans for a job
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: String,
    sample_rows: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(gpq_core::config::DEFAULT_SAMPLE_ROWS)
    }
}

impl QueryBuilder {
    pub fn new(sample_rows: usize) -> Self {
        Self { table: INTERMEDIATE_TABLE.to_string(), sample_rows }
    }

    /// Build the full plan set.
    ///
    /// The area of interest is brought into the canonical CRS first. An
    /// unrecognized output extension is an error.
    pub fn build(
        &self,
        source_url: &str,
        profile: &SourceProfile,
        aoi: Option<&AreaOfInterest>,
        target: &OutputTarget,
    ) -> Result<QuerySpec> {
        let format = target.format()?;
        let aoi = reproject_aoi(aoi)?;

        let materialize = self.materialize_plan(source_url, profile, aoi.as_ref().map(|a| &a.bbox), format);
        let sample = format
            .is_verbose_text()
            .then(|| self.sample_plan(&materialize, profile));
        let export = format.writer_options().map(|writer| {
            let hilbert_column =
                (!format.is_native()).then(|| profile.geometry_column().to_string());
            let sql = export_sql(&self.table, target, &writer.to_sql(), hilbert_column.as_deref());
            ExportPlan {
                table: self.table.clone(),
                destination: target.path().to_path_buf(),
                writer,
                hilbert_column,
                sql,
            }
        });

        tracing::debug!("Materialize SQL: {}", materialize.sql);
        Ok(QuerySpec { format, materialize, sample, export })
    }

    fn materialize_plan(
        &self,
        source_url: &str,
        profile: &SourceProfile,
        bbox: Option<&BoundingBox>,
        format: OutputFormat,
    ) -> MaterializePlan {
        let projection = projection(profile.schema(), format);
        let predicate = bbox.map(|bbox| match profile.bbox_column() {
            Some(column) => Predicate::BboxRange { column: column.to_string(), bbox: *bbox },
            None => Predicate::Intersects {
                column: profile.geometry_column().to_string(),
                bbox: *bbox,
            },
        });

        let mut sql = format!(
            "CREATE TABLE {} AS (SELECT {} FROM read_parquet({})",
            quote_identifier(&self.table),
            projection.join(", "),
            quote_literal(source_url)
        );
        if let Some(predicate) = &predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate_sql(predicate));
        }
        sql.push(')');

        MaterializePlan {
            table: self.table.clone(),
            source_url: source_url.to_string(),
            projection,
            predicate,
            sql,
        }
    }

    fn sample_plan(&self, materialize: &MaterializePlan, profile: &SourceProfile) -> SamplePlan {
        let geometry_column = profile.geometry_column().to_string();
        let property_columns: Vec<String> = output_columns(profile.schema())
            .into_iter()
            .filter(|name| name != &geometry_column)
            .collect();

        let properties = property_columns
            .iter()
            .map(|name| {
                format!(
                    "{}, COALESCE(CAST({} AS VARCHAR), 'null')",
                    quote_literal(name),
                    quote_identifier(name)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "WITH sample AS (SELECT * FROM {table} LIMIT {limit}) \
             SELECT AVG(LENGTH(json_object('type', 'Feature', 'geometry', ST_AsGeoJSON({geom}), \
             'properties', json_object({properties}))::VARCHAR)) AS avg_feature_size FROM sample",
            table = quote_identifier(&materialize.table),
            limit = self.sample_rows,
            geom = quote_identifier(&geometry_column),
            properties = properties,
        );

        SamplePlan {
            table: materialize.table.clone(),
            sample_size: self.sample_rows,
            geometry_column,
            property_columns,
            sql,
        }
    }
}

/// Select-list for the target format
fn projection(schema: &[Column], format: OutputFormat) -> Vec<String> {
    if format.is_native() || schema.is_empty() {
        return vec!["*".to_string()];
    }

    let mut items = Vec::with_capacity(schema.len() + 1);
    if promotes_primary_name(schema) {
        items.push(format!("{}.\"primary\" AS \"name\"", quote_identifier("names")));
    }

    for column in schema {
        let name = quote_identifier(&column.name);
        let item = if column.is_struct() || column.is_map() {
            format!("TO_JSON({0}) AS {0}", name)
        } else if column.is_list() {
            format!("array_to_string({0}, ', ') AS {0}", name)
        } else if NARROW_UNSIGNED_TYPES.contains(&column.data_type.to_uppercase().as_str()) {
            format!("CAST({0} AS INTEGER) AS {0}", name)
        } else {
            name
        };
        items.push(item);
    }
    items
}

/// `names` struct with a `primary` field, and no existing `name` column
fn promotes_primary_name(schema: &[Column]) -> bool {
    let has_names = schema
        .iter()
        .any(|c| c.name == "names" && c.is_struct() && c.data_type.contains("primary"));
    has_names && !schema.iter().any(|c| c.name == "name")
}

/// Column names of the intermediate table after projection
fn output_columns(schema: &[Column]) -> Vec<String> {
    let mut names = Vec::with_capacity(schema.len() + 1);
    if promotes_primary_name(schema) {
        names.push("name".to_string());
    }
    names.extend(schema.iter().map(|c| c.name.clone()));
    names
}

fn predicate_sql(predicate: &Predicate) -> String {
    match predicate {
        Predicate::BboxRange { column, bbox } => {
            let column = quote_identifier(column);
            format!(
                "{c}.xmin BETWEEN {} AND {} AND {c}.ymin BETWEEN {} AND {}",
                bbox.xmin,
                bbox.xmax,
                bbox.ymin,
                bbox.ymax,
                c = column
            )
        }
        Predicate::Intersects { column, bbox } => format!(
            "ST_Intersects({}, ST_GeomFromText({}))",
            quote_identifier(column),
            quote_literal(&bbox_wkt(bbox))
        ),
    }
}

fn export_sql(table: &str, target: &OutputTarget, options: &str, hilbert_column: Option<&str>) -> String {
    let table = quote_identifier(table);
    let select = match hilbert_column {
        Some(column) => {
            let column = quote_identifier(column);
            format!(
                "SELECT * FROM {t} ORDER BY ST_Hilbert({c}, \
                 (SELECT ST_Extent(ST_Extent_Agg(COLUMNS({c})))::BOX_2D FROM {t}))",
                t = table,
                c = column
            )
        }
        None => format!("SELECT * FROM {}", table),
    };
    format!(
        "COPY ({}) TO {} {}",
        select,
        quote_literal(&target.path().to_string_lossy()),
        options
    )
}
