use crate::client::{ApiClient, ApiError};
use crate::records::{ApiRecord, InventoryPart, Project};

/// Anything that can resolve an inventory ID to a part.
///
/// Lookups never fail loudly: an unresolvable ID is `None` and the cause is
/// logged by the implementation.
pub trait PartSource {
    fn fetch_part(&self, id: &str) -> Option<InventoryPart>;
}

/// PartDB instance reached through its REST API.
pub struct PartDb {
    client: ApiClient,
}

impl PartDb {
    pub fn new(base_url: &str, bearer: &str) -> Result<Self, ApiError> {
        let client = ApiClient::builder(base_url).bearer(bearer).build()?;
        log::debug!("Initialized PartDB client for {}", client.base_url());
        Ok(Self { client })
    }

    pub fn with_client(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `GET parts/{id}`, with errors.
    pub fn get_part(&self, id: &str) -> Result<InventoryPart, ApiError> {
        let endpoint = format!("parts/{}", urlencoding::encode(id.trim()));
        let data = self.client.get(&endpoint, &[])?;
        Ok(InventoryPart::parse(&data)?)
    }

    /// `GET projects`, with errors.
    pub fn get_projects(&self) -> Result<Vec<Project>, ApiError> {
        let data = self.client.get("projects", &[])?;
        let members = data
            .get("hydra:member")
            .and_then(|m| m.as_array())
            .ok_or(ApiError::MissingKey("hydra:member"))?;
        Ok(members
            .iter()
            .map(Project::parse)
            .collect::<Result<Vec<_>, _>>()?)
    }

    /// Projects on the server; empty when the request fails.
    pub fn list_projects(&self) -> Vec<Project> {
        match self.get_projects() {
            Ok(projects) => projects,
            Err(e) => {
                log::error!("Error fetching projects: {e}");
                Vec::new()
            }
        }
    }
}

impl PartSource for PartDb {
    fn fetch_part(&self, id: &str) -> Option<InventoryPart> {
        match self.get_part(id) {
            Ok(part) => Some(part),
            Err(e) => {
                log::error!("Error building part {id} from PartDB response: {e}");
                None
            }
        }
    }
}
