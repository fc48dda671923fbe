//! Asset selection flags shared by push, pull and diff

use clap::Args;

use crate::error::{CliError, CliResult};
use crate::models::AssetKind;
use crate::resource::SelectionPolicy;

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Select every asset of every kind
    #[arg(long)]
    pub all: bool,

    #[arg(long)]
    pub all_services: bool,
    /// Code service by name (repeatable)
    #[arg(long = "service-name", value_name = "NAME")]
    pub service_names: Vec<String>,

    #[arg(long)]
    pub all_libraries: bool,
    #[arg(long = "library-name", value_name = "NAME")]
    pub library_names: Vec<String>,

    /// Collections with their items
    #[arg(long)]
    pub all_collections: bool,
    #[arg(long = "collection-name", value_name = "NAME")]
    pub collection_names: Vec<String>,

    /// Collection definitions without their items
    #[arg(long)]
    pub all_collection_schemas: bool,
    #[arg(long = "collection-schema", value_name = "NAME")]
    pub collection_schemas: Vec<String>,

    #[arg(long)]
    pub all_users: bool,
    #[arg(long = "user-email", value_name = "EMAIL")]
    pub user_emails: Vec<String>,
    /// The user table schema
    #[arg(long)]
    pub user_schema: bool,

    #[arg(long)]
    pub all_roles: bool,
    #[arg(long = "role-name", value_name = "NAME")]
    pub role_names: Vec<String>,

    #[arg(long)]
    pub all_triggers: bool,
    #[arg(long = "trigger-name", value_name = "NAME")]
    pub trigger_names: Vec<String>,

    #[arg(long)]
    pub all_timers: bool,
    #[arg(long = "timer-name", value_name = "NAME")]
    pub timer_names: Vec<String>,

    #[arg(long)]
    pub all_devices: bool,
    #[arg(long = "device-name", value_name = "NAME")]
    pub device_names: Vec<String>,
    #[arg(long)]
    pub device_schema: bool,

    #[arg(long)]
    pub all_edges: bool,
    #[arg(long = "edge-name", value_name = "NAME")]
    pub edge_names: Vec<String>,
    #[arg(long)]
    pub edge_schema: bool,

    #[arg(long)]
    pub all_portals: bool,
    #[arg(long = "portal-name", value_name = "NAME")]
    pub portal_names: Vec<String>,

    #[arg(long)]
    pub all_plugins: bool,
    #[arg(long = "plugin-name", value_name = "NAME")]
    pub plugin_names: Vec<String>,

    #[arg(long)]
    pub all_adaptors: bool,
    #[arg(long = "adaptor-name", value_name = "NAME")]
    pub adaptor_names: Vec<String>,

    #[arg(long)]
    pub all_deployments: bool,
    #[arg(long = "deployment-name", value_name = "NAME")]
    pub deployment_names: Vec<String>,

    #[arg(long)]
    pub all_webhooks: bool,
    #[arg(long = "webhook-name", value_name = "NAME")]
    pub webhook_names: Vec<String>,

    #[arg(long)]
    pub all_external_databases: bool,
    #[arg(long = "external-database-name", value_name = "NAME")]
    pub external_database_names: Vec<String>,

    #[arg(long)]
    pub all_bucket_sets: bool,
    #[arg(long = "bucket-set-name", value_name = "NAME")]
    pub bucket_set_names: Vec<String>,

    #[arg(long)]
    pub all_secrets: bool,
    #[arg(long = "secret-name", value_name = "NAME")]
    pub secret_names: Vec<String>,

    #[arg(long)]
    pub all_shared_caches: bool,
    #[arg(long = "shared-cache-name", value_name = "NAME")]
    pub shared_cache_names: Vec<String>,

    #[arg(long)]
    pub all_file_stores: bool,
    #[arg(long = "file-store-name", value_name = "NAME")]
    pub file_store_names: Vec<String>,
}

impl SelectionArgs {
    fn per_kind(&self) -> [(AssetKind, bool, &[String]); 19] {
        [
            (AssetKind::Service, self.all_services, self.service_names.as_slice()),
            (AssetKind::Library, self.all_libraries, self.library_names.as_slice()),
            (AssetKind::Collection, self.all_collections, self.collection_names.as_slice()),
            (AssetKind::User, self.all_users, self.user_emails.as_slice()),
            (AssetKind::Role, self.all_roles, self.role_names.as_slice()),
            (AssetKind::Trigger, self.all_triggers, self.trigger_names.as_slice()),
            (AssetKind::Timer, self.all_timers, self.timer_names.as_slice()),
            (AssetKind::Device, self.all_devices, self.device_names.as_slice()),
            (AssetKind::Edge, self.all_edges, self.edge_names.as_slice()),
            (AssetKind::Portal, self.all_portals, self.portal_names.as_slice()),
            (AssetKind::Plugin, self.all_plugins, self.plugin_names.as_slice()),
            (AssetKind::Adaptor, self.all_adaptors, self.adaptor_names.as_slice()),
            (AssetKind::Deployment, self.all_deployments, self.deployment_names.as_slice()),
            (AssetKind::Webhook, self.all_webhooks, self.webhook_names.as_slice()),
            (
                AssetKind::ExternalDatabase,
                self.all_external_databases,
                self.external_database_names.as_slice(),
            ),
            (AssetKind::BucketSet, self.all_bucket_sets, self.bucket_set_names.as_slice()),
            (AssetKind::Secret, self.all_secrets, self.secret_names.as_slice()),
            (AssetKind::SharedCache, self.all_shared_caches, self.shared_cache_names.as_slice()),
            (AssetKind::FileStore, self.all_file_stores, self.file_store_names.as_slice()),
        ]
    }

    /// Selection policy for these flags; selecting nothing is an error.
    pub fn to_policy(&self) -> CliResult<SelectionPolicy> {
        let mut policy = if self.all {
            SelectionPolicy::everything()
        } else {
            SelectionPolicy::new()
        };

        for (kind, all, names) in self.per_kind() {
            if all {
                policy = policy.with_all(kind);
            }
            for name in names {
                policy = policy.with_name(kind, name.as_str());
            }
        }
        for (kind, selected) in [
            (AssetKind::UserSchema, self.user_schema),
            (AssetKind::DeviceSchema, self.device_schema),
            (AssetKind::EdgeSchema, self.edge_schema),
        ] {
            if selected {
                policy = policy.with_all(kind);
            }
        }
        if self.all_collection_schemas {
            policy = policy.with_all_collection_schemas();
        }
        for name in &self.collection_schemas {
            policy = policy.with_collection_schema(name.as_str());
        }

        if policy.is_empty() {
            return Err(CliError::Validation(
                "Nothing selected. Use --all, an --all-<kind> flag or a --<kind>-name selector."
                    .into(),
            ));
        }
        Ok(policy)
    }
}
