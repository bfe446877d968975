#![forbid(unsafe_code)]

use anyhow::{anyhow, Result};
use fs_mistrust::Mistrust;
use lazy_static::lazy_static;
use log::{error, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::Deserialize;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;
use std::{env, fs, path::Path};
use structopt::StructOpt;
use toml;

// Numclass utilities
use crate::utils::errors::Errors;
use crate::utils::facts::FactClient;
use crate::utils::web_utils::get_absolute_path;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Directory and file locations. Unless otherwise noted, all files and directories
// are relative to the root directory.
const ENV_NUMCLASS_ROOT_DIR : &str = "NUMCLASS_ROOT_DIR";
const DEFAULT_ROOT_DIR      : &str = "~/.numclass";
const CONFIG_DIR            : &str = "/config";
const LOGS_DIR              : &str = "/logs";
const STATIC_DIR            : &str = "/static";
const LOG4RS_CONFIG_FILE    : &str = "/log4rs.yml";      // relative to config dir
const NUMCLASS_CONFIG_FILE  : &str = "/numclass.toml";   // relative to config dir

// Networking.
const DEFAULT_HTTP_ADDR     : &str = "0.0.0.0";
const DEFAULT_HTTP_PORT     : u16  = 8000;

// Trivia fact service.
const DEFAULT_FACTS_BASE_URL    : &str = "http://numbersapi.com";
const DEFAULT_FACT_TIMEOUT_SECS : u64  = 5;

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref NUMCLASS_ARGS: NumclassArgs = init_numclass_args();
}

// Calculate the data directories BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref NUMCLASS_DIRS: NumclassDirs = init_numclass_dirs();
}

// ***************************************************************************
//                             Directory Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// NumclassDirs:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct NumclassDirs {
    pub root_dir: String,
    pub config_dir: String,
    pub logs_dir: String,
    pub static_dir: String,
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// CommandLineArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "numclass_args", about = "Command line arguments for the number classification server.")]
pub struct NumclassArgs {
    /// Specify the server's root data directory.
    ///
    /// This directory contains the configuration, log and static files the
    /// server uses during execution.
    #[structopt(short, long)]
    pub root_dir: Option<String>,

    /// Create the data directories and then exit.
    ///
    /// The data directories will be rooted at a root directory calculated
    /// using the following priority order:
    ///
    ///   1. If set, the value of the NUMCLASS_ROOT_DIR environment,
    ///
    ///   2. Otherwise, if set, the value of the --root_dir command line argument,
    ///
    ///   3. Otherwise, ~/.numclass
    ///
    #[structopt(short, long)]
    pub create_dirs_only: bool,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct Parms {
    pub config_file: String,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub facts: FactClient,
    pub numclass_args: &'static NumclassArgs,
    pub numclass_dirs: &'static NumclassDirs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub http_addr: String,
    pub http_port: u16,
    pub facts_base_url: String,
    pub fact_timeout_secs: u64,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn fact_timeout(&self) -> Duration {
        Duration::from_secs(self.fact_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Number Classification API".to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            facts_base_url: DEFAULT_FACTS_BASE_URL.to_string(),
            fact_timeout_secs: DEFAULT_FACT_TIMEOUT_SECS,
        }
    }
}

// ***************************************************************************
//                            Directory Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_numclass_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_numclass_args() -> NumclassArgs {
    let args = NumclassArgs::from_args();
    println!("{:?}", args);
    args
}

// ---------------------------------------------------------------------------
// init_numclass_dirs:
// ---------------------------------------------------------------------------
/** Calculate the external data directories. */
fn init_numclass_dirs() -> NumclassDirs {
    // Initialize the mistrust object.
    let mistrust = get_mistrust();

    // Check that each path is absolute and is a directory with the
    // proper permission assign if it exists.  If it doesn't exist,
    // create it.
    let root_dir = get_root_dir();
    check_numclass_dir(&root_dir, "root directory", &mistrust);

    let config_dir = root_dir.clone() + CONFIG_DIR;
    check_numclass_dir(&config_dir, "config directory", &mistrust);

    let logs_dir = root_dir.clone() + LOGS_DIR;
    check_numclass_dir(&logs_dir, "logs directory", &mistrust);

    let static_dir = root_dir.clone() + STATIC_DIR;
    check_numclass_dir(&static_dir, "static directory", &mistrust);

    // Package up and return the directories.
    NumclassDirs {
        root_dir, config_dir, logs_dir, static_dir,
    }
}

// ---------------------------------------------------------------------------
// check_numclass_dir:
// ---------------------------------------------------------------------------
/** Check that the path is absolute and, if it exists, that is has the proper
 * permissions assigned.  If it doesn't exist, create it.  The mistrust package
 * creates directories with 0o700 permissions.
 *
 * Any failure results in a panic.
 */
fn check_numclass_dir(dir: &String, msgname: &str, mistrust: &Mistrust) {
    // Get the path object.
    let path = Path::new(dir);
    if !path.is_absolute() {
        panic!("The numclass {} path must be absolute: {}", msgname, dir);
    }
    if path.exists() {
        // Make sure the path represents a directory.
        if !path.is_dir() {
            panic!("The numclass {} path must be a directory: {}", msgname, dir);
        }

        // Make sure the directory had rwx for owner only.
        let meta = path.metadata().unwrap_or_else(|_| panic!("Unable to read metadata for {}: {}", msgname, dir));
        let perm = meta.permissions().mode();
        if perm & 0o777 != 0o700 {
            panic!("The numclass {} path must be have 0o700 permissions: {}", msgname, dir);
        }
    } else {
        // Create the directory with the correct permissions.
        match mistrust.make_directory(path) {
            Ok(_) => (),
            Err(e) => {
                panic!("Make directory error for {:?}: {}", path, &e.to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// get_mistrust:
// ---------------------------------------------------------------------------
/** Configure a new mistrust object for initial directory processing. */
fn get_mistrust() -> Mistrust {
    // Configure our mistrust object.
    let mistrust = match Mistrust::builder()
        .ignore_prefix(get_absolute_path("~"))
        .trust_group(0)
        .build() {
            Ok(m) => m,
            Err(e) => {
                panic!("Mistrust configuration error: {}", &e.to_string());
            }
        };
    mistrust
}

// ---------------------------------------------------------------------------
// get_root_dir:
// ---------------------------------------------------------------------------
fn get_root_dir() -> String {
    // Order of precedence:
    //  1. Environment variable
    //  2. Command line --root-dir argument
    //  3. Default location
    //
    let root_dir = env::var(ENV_NUMCLASS_ROOT_DIR).unwrap_or_else(
        |_| {
            match NUMCLASS_ARGS.root_dir.clone() {
                Some(r) => r,
                None => DEFAULT_ROOT_DIR.to_string(),
            }
        });

    // Canonicalize the path.
    get_absolute_path(&root_dir)
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
/** Initialize log4rs from the configuration file when one is present,
 * otherwise fall back to a console appender at info level so the server
 * still logs on a fresh installation.
 */
pub fn init_log() {
    let logconfig = init_log_config();
    if Path::new(&logconfig).is_file() {
        match log4rs::init_file(logconfig.clone(), Default::default()) {
            Ok(_) => {
                info!("Log4rs initialized using: {}", logconfig);
                return;
            },
            Err(e) => {
                println!("{}: {}", Errors::Log4rsInitialization(logconfig), e);
            },
        }
    }
    init_console_log();
}

// ---------------------------------------------------------------------------
// init_console_log:
// ---------------------------------------------------------------------------
fn init_console_log() {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d} {l} {t} - {m}{n}")))
        .build();
    let config = match LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info)) {
            Ok(c) => c,
            Err(e) => {
                panic!("Unable to assemble the console log configuration: {}", e);
            }
        };
    if let Err(e) = log4rs::init_config(config) {
        println!("Unable to initialize console logging: {}", e);
        return;
    }
    info!("Log4rs initialized with the default console appender.");
}

// ---------------------------------------------------------------------------
// init_log_config:
// ---------------------------------------------------------------------------
fn init_log_config() -> String {
    NUMCLASS_DIRS.config_dir.clone() + LOG4RS_CONFIG_FILE
}

/// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file in the
 * config data directory.  If the file cannot be read, default values are
 * used for all parameters.
 */
fn get_parms() -> Result<Parms> {
    // Get the config file path from its data directory.
    let config_file = NUMCLASS_DIRS.config_dir.clone() + NUMCLASS_CONFIG_FILE;

    // Read the cofiguration file.
    let config_file_abs = get_absolute_path(&config_file);
    info!("{}", Errors::ReadingConfigFile(config_file_abs.clone()));
    let contents = match fs::read_to_string(&config_file_abs) {
        Ok(c) => c,
        Err(_) => {
            println!("Unable to read configuration at {}. Using default values.", config_file);
            return Ok(Parms { config_file: Default::default(), config: Config::new() });
        }
    };

    // Parse the toml configuration.
    let config : Config = match toml::from_str(&contents) {
        Ok(c)  => c,
        Err(e) => {
            let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file_abs), e);
            error!("{}", msg);
            return Result::Err(anyhow!(msg));
        }
    };

    Ok(Parms { config_file: config_file_abs, config })
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
pub fn init_runtime_context() -> RuntimeCtx {
    // If either of these fail the application aborts.
    let parms = get_parms().expect("FAILED to read configuration file.");
    let facts = FactClient::new(&parms.config.facts_base_url, parms.config.fact_timeout())
        .expect("FAILED to build the trivia fact client.");
    RuntimeCtx {parms, facts, numclass_args: &NUMCLASS_ARGS, numclass_dirs: &NUMCLASS_DIRS}
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_config() {
        println!("{:?}", Config::new());
    }

    #[test]
    fn default_config_values() {
        let config = Config::new();
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.facts_base_url, DEFAULT_FACTS_BASE_URL);
        assert_eq!(config.fact_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str("http_port = 9000").unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.http_addr, DEFAULT_HTTP_ADDR);
        assert_eq!(config.facts_base_url, DEFAULT_FACTS_BASE_URL);
    }
}
