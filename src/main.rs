/// Native command-line host: runs one population query against a backend.
#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::run()
}

// WASM doesn't use main(), it uses wasm_bindgen's start function
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use areapop::api::ReqwestTransport;
    use areapop::cache::{BoundaryCache, MemoryStore};
    use areapop::config::{AppConfig, LogLevel};
    use areapop::constants::CIRCLE_SEGMENTS;
    use areapop::geo::LatLng;
    use areapop::mode::ModeEffect;
    use areapop::model::{Selection, SelectionMode};
    use areapop::query::QueryOrchestrator;
    use areapop::region::{RegionError, fetch_hierarchy};
    use areapop::report::AnalysisReport;
    use areapop::session::{MapSession, Presenter};
    use clap::{Parser, Subcommand};

    type NativeSession = MapSession<ReqwestTransport, MemoryStore>;

    #[derive(Debug, Parser)]
    #[command(name = "areapop", version, about = "Population statistics for a map area")]
    struct Cli {
        /// Backend origin, overrides the config file
        #[arg(long, global = true)]
        base_url: Option<String>,

        /// Config file (defaults to the platform config directory)
        #[arg(long, global = true)]
        config: Option<PathBuf>,

        /// Log verbosity, overrides the config file
        #[arg(long, global = true, value_parser = parse_log_level)]
        log_level: Option<LogLevel>,

        /// Print the raw result as JSON instead of the report
        #[arg(long, global = true)]
        json: bool,

        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Query a circle
        Circle {
            #[arg(long, allow_negative_numbers = true)]
            lat: f64,
            #[arg(long, allow_negative_numbers = true)]
            lng: f64,
            /// Radius in meters
            #[arg(long)]
            radius: f64,
        },
        /// Query a polygon given as `lat,lng` vertices in drawing order
        Polygon {
            #[arg(required = true, value_parser = parse_lat_lng)]
            vertices: Vec<LatLng>,
        },
        /// Query an administrative region (province, then district, then subdistrict)
        Region {
            sido: String,
            sigungu: Option<String>,
            dong: Option<String>,
        },
        /// Write the effective configuration to the default path
        SaveConfig,
    }

    fn parse_lat_lng(s: &str) -> Result<LatLng, String> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected `lat,lng`, got `{}`", s))?;
        let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {}", e))?;
        let lng: f64 = lng.trim().parse().map_err(|e| format!("bad longitude: {}", e))?;
        Ok(LatLng::new(lat, lng))
    }

    fn parse_log_level(s: &str) -> Result<LogLevel, String> {
        LogLevel::all()
            .iter()
            .copied()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level `{}`", s))
    }

    /// Prints panel updates to the terminal.
    #[derive(Debug, Default)]
    struct TextPresenter {
        json: bool,
        failed: bool,
    }

    impl Presenter for TextPresenter {
        fn show_loading(&mut self) {
            log::debug!("⏳ Loading...");
        }

        fn show_analysis(&mut self, report: &AnalysisReport) {
            if !self.json {
                print!("{}", report.to_text());
            }
        }

        fn show_error(&mut self, message: &str) {
            self.failed = true;
            eprintln!("Error: {}", message);
        }
    }

    pub fn run() -> ExitCode {
        let cli = Cli::parse();

        let mut config = match &cli.config {
            Some(path) => match AppConfig::load_from_path(path) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            },
            None => AppConfig::load_from_default_path().unwrap_or_default(),
        };
        if let Some(base_url) = cli.base_url.clone() {
            config.api.base_url = base_url;
        }
        if let Some(level) = cli.log_level {
            config.preferences.log_level = level;
        }

        env_logger::Builder::new()
            .filter_level(config.preferences.log_level.to_level_filter())
            .parse_default_env()
            .init();

        if matches!(cli.command, Command::SaveConfig) {
            return match config.save_to_default_path() {
                Ok(path) => {
                    println!("{}", path.display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            };
        }

        let mut session = match build_session(&config) {
            Ok(session) => session,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        };
        let mut presenter = TextPresenter {
            json: cli.json,
            failed: false,
        };

        let pending = match cli.command {
            Command::Circle { lat, lng, radius } => session.begin_query(
                Selection::Circle {
                    center: LatLng::new(lat, lng),
                    radius_m: radius,
                    segments: CIRCLE_SEGMENTS,
                },
                &mut presenter,
            ),
            Command::Polygon { vertices } => {
                session.begin_query(Selection::Polygon { vertices }, &mut presenter)
            }
            Command::Region {
                sido,
                sigungu,
                dong,
            } => {
                if !select_region(&mut session, &config, &sido, sigungu, dong, &mut presenter) {
                    return ExitCode::FAILURE;
                }
                session.query_region(&mut presenter)
            }
            Command::SaveConfig => None,
        };
        let Some(pending) = pending else {
            return ExitCode::FAILURE;
        };

        let orchestrator = session.orchestrator();
        let outcome = pollster::block_on(orchestrator.execute(pending));
        if cli.json {
            if let areapop::query::QueryOutcome::Completed { result: Ok(r), .. } = &outcome {
                match serde_json::to_string_pretty(r) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
        }
        session.apply_outcome(outcome, &mut presenter);

        if presenter.failed {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    fn build_session(config: &AppConfig) -> Result<NativeSession, areapop::api::TransportError> {
        let transport = ReqwestTransport::new(config.api.base_url.clone(), config.api.timeout_secs)?;
        let cache = BoundaryCache::new(MemoryStore::with_quota(config.cache.memory_quota_bytes))
            .with_namespace(config.cache.namespace.clone())
            .with_max_entries(config.cache.max_entries);
        let orchestrator =
            QueryOrchestrator::new(transport, cache).with_endpoints(config.api.endpoints());
        Ok(MapSession::new(orchestrator))
    }

    /// Load the hierarchy and walk the region dropdowns like a user would.
    fn select_region(
        session: &mut NativeSession,
        config: &AppConfig,
        sido: &str,
        sigungu: Option<String>,
        dong: Option<String>,
        presenter: &mut TextPresenter,
    ) -> bool {
        if session.switch_mode(SelectionMode::Region) == Some(ModeEffect::LoadHierarchy) {
            let orchestrator = session.orchestrator();
            let result = pollster::block_on(fetch_hierarchy(
                orchestrator.transport(),
                &config.api.hierarchy_path,
            ));
            session.hierarchy_loaded(result, presenter);
            if presenter.failed {
                return false;
            }
        }

        if let Err(e) = choose(session, sido, sigungu.as_deref(), dong.as_deref()) {
            presenter.show_error(&e.to_string());
            return false;
        }
        true
    }

    fn choose(
        session: &mut NativeSession,
        sido: &str,
        sigungu: Option<&str>,
        dong: Option<&str>,
    ) -> Result<(), RegionError> {
        session.select_province(Some(sido))?;
        if let Some(sigungu) = sigungu {
            session.select_district(Some(sigungu))?;
        }
        if let Some(dong) = dong {
            session.select_subdistrict(Some(dong))?;
        }
        Ok(())
    }
}
