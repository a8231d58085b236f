use std::path::PathBuf;

use clap::Subcommand;
use org_directory::infra::dataset::Dataset;
use org_directory::{GeoPoint, OrgDirectoryModule, OrganizationFilter, ProximityQuery};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Subcommand)]
pub enum Command {
    /// Validate configuration, open the store and exit
    Check,
    /// Load a JSON dataset into the database store
    Seed {
        /// JSON dataset file
        file: PathBuf,
    },
    /// Show one organization by id
    Organization { id: i64 },
    /// List organizations matching every given filter
    Organizations {
        /// Building the organization is housed in
        #[arg(long)]
        building: Option<i64>,
        /// Operation type linked directly to the organization
        #[arg(long)]
        operation_type: Option<i64>,
        /// Case-insensitive part of the title
        #[arg(long)]
        title: Option<String>,
    },
    /// Organizations in a category or any of its subcategories
    ByOperationType {
        /// Case-insensitive part of the category title; all categories when omitted
        pattern: Option<String>,
    },
    /// Organizations housed within a radius of a point
    Nearby {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Radius in meters; the configured default when omitted
        #[arg(long)]
        radius: Option<f64>,
    },
    /// List all buildings
    Buildings,
    /// Show one building by id
    Building { id: i64 },
}

impl Command {
    /// Runs a query against the directory and returns its JSON rendering.
    ///
    /// # Errors
    /// Propagates directory and dataset errors.
    pub async fn execute(
        self,
        module: &OrgDirectoryModule,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Value> {
        let client = module.client();
        let value = match self {
            Self::Check => serde_json::json!({
                "status": "ok",
                "seeded": module.seeded(),
            }),
            Self::Seed { file } => {
                let dataset = Dataset::from_path(&file)?;
                serde_json::to_value(module.seed(&dataset).await?)?
            }
            Self::Organization { id } => {
                serde_json::to_value(client.get_organization(cancel, id).await?)?
            }
            Self::Organizations {
                building,
                operation_type,
                title,
            } => {
                let filter = OrganizationFilter {
                    building_id: building,
                    operation_type_id: operation_type,
                    title,
                };
                serde_json::to_value(client.list_organizations(cancel, &filter).await?)?
            }
            Self::ByOperationType { pattern } => serde_json::to_value(
                client
                    .search_by_operation_type(cancel, pattern.as_deref())
                    .await?,
            )?,
            Self::Nearby { lat, lon, radius } => {
                let mut query = ProximityQuery::new(GeoPoint::new(lat, lon));
                query.radius_meters = radius;
                serde_json::to_value(client.search_nearby(cancel, &query).await?)?
            }
            Self::Buildings => serde_json::to_value(client.list_buildings(cancel).await?)?,
            Self::Building { id } => serde_json::to_value(client.get_building(cancel, id).await?)?,
        };

        if let Value::Array(items) = &value {
            debug!(count = items.len(), "Query returned");
        }
        Ok(value)
    }
}
