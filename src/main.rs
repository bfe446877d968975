#![forbid(unsafe_code)]

use lazy_static::lazy_static;
use log::info;
use poem::endpoint::StaticFileEndpoint;
use poem::listener::TcpListener;
use poem::middleware::Cors;
use poem::web::Json;
use poem::{get, handler, EndpointExt, Route};
use poem_openapi::OpenApiService;

// Numclass utilities
use crate::utils::config::{init_log, init_runtime_context, RuntimeCtx, NUMCLASS_DIRS};
use crate::utils::errors::Errors;
use crate::v1::api::classify_number::ClassifyNumberApi;

// Modules
mod utils;
mod v1;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "NumclassServer"; // for poem logging

const WELCOME_MSG : &str =
    "Welcome to the Number Classification API! Use /api/classify-number?number=<number> to classify a number.";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the runtime context so that it has a 'static lifetime.
// The context holds the application parameters and the shared trivia fact
// client.  We exit if we can't read our parameters.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // --------------- Initialize Numclass ------------
    // Announce ourselves.
    println!("Starting numclass_server!");

    // Initialize the server.
    numclass_init();

    // The data directories were created as a side effect of reading the
    // runtime context; nothing else to do in this mode.
    if RUNTIME_CTX.numclass_args.create_dirs_only {
        println!("Data directories created under {}.", NUMCLASS_DIRS.root_dir);
        return Ok(());
    }

    // --------------- Main Loop Set Up ---------------
    // Assign base URL.
    let api_url = format!("http://{}:{}{}",
        RUNTIME_CTX.parms.config.http_addr,
        RUNTIME_CTX.parms.config.http_port,
        "/api");

    // The classification endpoint is the whole api surface.
    let api_service =
        OpenApiService::new(ClassifyNumberApi, "Number Classification API", "0.1.0").server(api_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();

    // Create the routes and run the server.
    let addr = format!("{}{}", "0.0.0.0:", RUNTIME_CTX.parms.config.http_port);
    let ui = api_service.swagger_ui();
    let favicon =
        StaticFileEndpoint::new(format!("{}/favicon.ico", NUMCLASS_DIRS.static_dir));
    let app = Route::new()
        .nest("/api", api_service)
        .nest("/docs", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml)
        .at("/favicon.ico", favicon)
        .at("/", get(read_root))
        .with(Cors::new());

    // ------------------ Main Loop -------------------
    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run(app)
        .await
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// numclass_init:
// ---------------------------------------------------------------------------
/** Initialize all subsystems and data structures other than those needed
 * to configure the main loop processor.
 */
fn numclass_init() {
    // Configure our log.
    init_log();

    // Force the reading of input parameters and initialization of the runtime
    // context, which also builds the shared trivia fact client.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    info!("{}.", format!("\n*** Running numclass_server={}",
                        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")),
    );
}

// ***************************************************************************
//                              Root Endpoint
// ***************************************************************************
// ---------------------------------------------------------------------------
// read_root endpoint:
// ---------------------------------------------------------------------------
#[handler]
fn read_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": WELCOME_MSG }))
}
