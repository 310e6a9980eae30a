use std::collections::BTreeSet;

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, ListParams};

/// Source of the custom resource definitions installed on the cluster.
///
/// Fronted by a trait so the check logic is testable without an API
/// server; production uses [`ApiServerCrds`].
#[allow(async_fn_in_trait)]
pub trait CrdSource: Send + Sync {
    /// `metadata.name` of every installed CRD (e.g. `tfjobs.kubeflow.org`).
    async fn installed(&self) -> Result<BTreeSet<String>, CrdQueryError>;
}

/// Lists CRDs through the Kubernetes API using the ambient kubeconfig.
pub struct ApiServerCrds;

impl CrdSource for ApiServerCrds {
    async fn installed(&self) -> Result<BTreeSet<String>, CrdQueryError> {
        let client = kube::Client::try_default()
            .await
            .map_err(|e| CrdQueryError::Connect { source: e })?;
        let api: Api<CustomResourceDefinition> = Api::all(client);
        let crds = api
            .list(&ListParams::default())
            .await
            .map_err(|e| CrdQueryError::List { source: e })?;

        Ok(crds
            .items
            .into_iter()
            .filter_map(|crd| crd.metadata.name)
            .collect())
    }
}

/// Outcome of comparing required CRDs against the cluster.
///
/// A failed query is its own variant rather than an empty missing set, so
/// callers decide between warn-and-continue and abort deliberately.
#[derive(Debug)]
pub enum CrdCheck {
    /// Every required CRD is installed (or nothing was required).
    Satisfied,
    /// Required CRDs the cluster does not have.
    Missing(BTreeSet<String>),
    /// The cluster could not be queried; nothing is known about the CRDs.
    QueryFailed(CrdQueryError),
}

/// Compare a required CRD set against what the cluster reports.
pub async fn missing_crds<S: CrdSource>(source: &S, required: &BTreeSet<String>) -> CrdCheck {
    if required.is_empty() {
        return CrdCheck::Satisfied;
    }
    match source.installed().await {
        Ok(installed) => {
            let missing: BTreeSet<String> = required.difference(&installed).cloned().collect();
            if missing.is_empty() {
                CrdCheck::Satisfied
            } else {
                CrdCheck::Missing(missing)
            }
        }
        Err(e) => CrdCheck::QueryFailed(e),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrdQueryError {
    #[error("could not connect to the cluster API")]
    Connect { source: kube::Error },

    #[error("listing custom resource definitions failed")]
    List { source: kube::Error },
}
