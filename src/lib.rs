//! # Reinhardt Admin Console
//!
//! An extensible admin console layer. Host modules register navigable pages,
//! bare routes and per-model CRUD sections on an [`AdminSite`] at startup; at
//! request time the dispatcher resolves the matched page, runs its handler
//! and renders the result through the templater.
//!
//! The console does not own templating, storage, routing or authentication.
//! Each is a collaborator trait with a bundled in-process implementation:
//!
//! | Concern   | Trait                        | Bundled implementation        |
//! |-----------|------------------------------|-------------------------------|
//! | Routing   | [`router::Router`]           | [`router::RouteTable`]        |
//! | Rendering | [`templates::Templater`]     | [`templates::TeraTemplater`]  |
//! | Storage   | [`storage::ModelStore`]      | [`storage::MemoryStore`]      |
//! | Import    | [`import::Importer`]         | [`import::FileImporter`]      |
//! | Auth      | [`auth::AdminAuth`]          | [`auth::RouteGuards`]         |
//!
//! ## Handler shapes
//!
//! Pages are served by a [`Handler`]: a template name, an async callback, or
//! a fixed render directive. Callbacks report what they produced through
//! [`HandlerOutput`]:
//!
//! - `Handled`: the callback wrote (or withheld) the response itself
//! - `Content(html)`: wrapped as `content` inside the admin layout
//! - `Directive { template, options }`: rendered with the options merged
//!   over the standard page context
//!
//! ## Quick Start
//!
//! ```
//! use reinhardt_admin_console::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let repository = Arc::new(MemoryRepository::new());
//! repository.register(
//!     ModelSchema::new("invoice")
//!         .attribute("number", AttributeMeta::new(AttributeType::String)),
//! );
//!
//! let router = Arc::new(RouteTable::new());
//! let site = AdminSite::builder()
//!     .router(router.clone())
//!     .repository(repository)
//!     .build()
//!     .unwrap();
//!
//! site.register_page(
//!     "Help",
//!     "help",
//!     PageOptions::new().with_icon("fa fa-question"),
//!     Handler::callback(|_request, _response| async { Ok(HandlerOutput::from("<p>Help</p>")) }),
//! )
//! .unwrap();
//! site.register_model(&ModelConfig::for_model("invoice")).unwrap();
//!
//! let response = router.handle(Request::get("/admin/invoices")).await.unwrap();
//! assert_eq!(response.status, http::StatusCode::OK);
//! # });
//! ```

pub mod auth;
pub mod conf;
pub mod crud;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod import;
pub mod introspect;
pub mod messages;
pub mod registry;
pub mod router;
pub mod site;
pub mod storage;
pub mod templates;
pub mod text;

pub use conf::AdminSettings;
pub use crud::{CrudEngine, ModelConfig, SaveAction, SaveOutcome};
pub use dispatch::DispatchOutcome;
pub use error::{AdminError, AdminResult, StorageError};
pub use handler::{Handler, HandlerOutput, RenderDirective};
pub use site::{AdminSite, AdminSiteBuilder};

/// Re-exports for host modules
pub mod prelude {
	pub use crate::auth::{AdminAuth, Guard, RouteGuards};
	pub use crate::conf::AdminSettings;
	pub use crate::crud::{ConfigResolver, CrudEngine, ModelConfig, SaveAction, SaveOutcome};
	pub use crate::dispatch::DispatchOutcome;
	pub use crate::error::{AdminError, AdminResult, StorageError};
	pub use crate::handler::{Handler, HandlerOutput, PageHandler, RenderDirective};
	pub use crate::http::{Request, Response, ResponseWriter, UploadedFile};
	pub use crate::import::{FileImporter, ImportFormat, Importer};
	pub use crate::messages::{FlashMessages, Level, Message};
	pub use crate::registry::{ActionOptions, ActionRegistry, NavEntry, PageOptions, Registry};
	pub use crate::router::{Endpoint, Middleware, RouteTable, Router};
	pub use crate::site::AdminSite;
	pub use crate::storage::{
		AttributeMeta, AttributeType, FindQuery, MemoryRepository, MemoryStore, ModelSchema,
		ModelStore, Record, Repository,
	};
	pub use crate::templates::{TeraTemplater, Templater};
}
