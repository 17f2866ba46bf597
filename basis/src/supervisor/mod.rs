use crate::{
    config::Config,
    detector::{Detector, TakerFees, opportunity::ArbitrageOpportunity},
    error::EngineError,
    manager::{ExchangeHandle, ExchangeManager},
    persistence::{ContextRepository, FileContextRepository},
    strategy::{StrategyTask, TaskCommand, context::TaskContext},
};
use basis_data::{
    aggregator::{MarketDataCache, MarketKey},
    exchange::{
        gateio::{perpetual::GateioPerpetualsUsd, spot::GateioSpot},
        mexc::Mexc,
    },
    streams::consumer::{STREAM_RECONNECTION_POLICY, init_market_stream},
    subscription::{Subscription, book::BookTickers},
};
use basis_execution::client::{ApiCredentials, ExecutionClient, init_execution_client};
use basis_instrument::{
    exchange::{ExchangeId, ExchangeRole},
    instrument::{MarketDataInstrument, kind::MarketDataInstrumentKind},
};
use rust_decimal::prelude::ToPrimitive;
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{error, info, warn};

/// Strategy name used for deterministic task identifiers.
const STRATEGY_NAME: &str = "spot_futures_arbitrage";

/// Capacity of the detector -> strategy opportunity channels.
const OPPORTUNITY_CHANNEL_CAPACITY: usize = 32;

/// Interval at which operator control files are polled.
const CONTROL_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A spawned strategy task with its operator command channel.
#[derive(Debug)]
struct TaskHandle {
    command_tx: mpsc::Sender<TaskCommand>,
    join: JoinHandle<TaskContext>,
}

/// Spawns, monitors and shuts down every engine task: per-venue market data streams, the
/// detector, the opportunity router, and one strategy task per enabled instrument.
///
/// Shutdown is cooperative - every task observes the shared watch flag at its suspension
/// points, cancels in-flight orders, and flushes its final context before unwinding.
#[derive(Debug)]
pub struct Supervisor {
    config: Config,
    repository: Arc<FileContextRepository>,
    cache: Arc<MarketDataCache>,
    shutdown_tx: watch::Sender<bool>,
    tasks: HashMap<crate::strategy::context::TaskId, TaskHandle>,
    background: Vec<JoinHandle<()>>,
}

impl Supervisor {
    pub fn new(config: Config) -> Result<Self, EngineError> {
        let repository = Arc::new(FileContextRepository::new(config.state_dir.clone())?);

        // Pre-register a cache slot per (venue, instrument) fingerprint
        let keys = config
            .arbitrage
            .enabled_exchanges
            .iter()
            .flat_map(|exchange| {
                config.arbitrage.enabled_instruments.iter().map(|instrument| {
                    MarketKey::new(
                        *exchange,
                        MarketDataInstrument::new(
                            instrument.base.clone(),
                            instrument.quote.clone(),
                            exchange.market_kind(),
                        ),
                    )
                })
            })
            .collect::<Vec<_>>();

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            repository,
            cache: Arc::new(MarketDataCache::new(keys)),
            shutdown_tx,
            tasks: HashMap::new(),
            background: Vec::new(),
        })
    }

    /// Initialise every component and run until [`Supervisor::shutdown`] is invoked.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        let shutdown_rx = self.shutdown_tx.subscribe();

        // Public plane: one book ticker stream per enabled venue feeding the shared cache
        for exchange in self.config.arbitrage.enabled_exchanges.clone() {
            self.spawn_market_data(exchange, shutdown_rx.clone());
        }

        // Private plane: one execution client per enabled venue
        let clients = self.init_execution_clients()?;

        // One strategy task per enabled instrument, rehydrated from durable storage
        let persisted = self.repository.load_all().await?;
        let mut routes = HashMap::new();

        let spot_exchange = self.spot_exchange()?;
        let futures_exchange = self.futures_exchange()?;
        let mut fees = TakerFees::default();

        for instrument_config in self.config.arbitrage.enabled_instruments.clone() {
            let instrument = MarketDataInstrument::new(
                instrument_config.base.clone(),
                instrument_config.quote.clone(),
                MarketDataInstrumentKind::Spot,
            );

            let manager = self
                .init_exchange_manager(&clients, &instrument, spot_exchange, futures_exchange)
                .await?;
            let manager = Arc::new(manager);

            let context = TaskContext::new(
                STRATEGY_NAME,
                instrument.clone(),
                spot_exchange,
                futures_exchange,
            );

            // Resume unfinished work from the last durable snapshot
            let context = persisted
                .iter()
                .find(|candidate| candidate.task_id == context.task_id)
                .filter(|candidate| !candidate.state.is_terminal())
                .cloned()
                .inspect(|candidate| {
                    info!(
                        task_id = %candidate.task_id,
                        state = candidate.state.name(),
                        "rehydrated TaskContext from durable storage"
                    );
                })
                .unwrap_or(context);

            let (opportunity_tx, opportunity_rx) =
                mpsc::channel::<ArbitrageOpportunity>(OPPORTUNITY_CHANNEL_CAPACITY);
            let (command_tx, command_rx) = mpsc::channel::<TaskCommand>(8);

            routes.insert(
                (instrument.base.clone(), instrument.quote.clone()),
                opportunity_tx,
            );

            let task = StrategyTask::new(
                context.clone(),
                Arc::clone(&manager),
                Arc::clone(&self.cache),
                self.repository.clone() as Arc<dyn ContextRepository>,
                opportunity_rx,
                command_rx,
                shutdown_rx.clone(),
                self.config.strategy.clone(),
                self.config.arbitrage.clone(),
            );

            self.tasks.insert(
                context.task_id.clone(),
                TaskHandle {
                    command_tx,
                    join: tokio::spawn(task.run()),
                },
            );

            // Detector fees come from the venue trading rules loaded by the manager
            fees.extend(manager_taker_fees(&manager));
        }

        // One detector over all instruments, routing emissions per strategy task
        self.spawn_detector(fees, routes, shutdown_rx.clone());

        // Operator control files
        self.spawn_control_poller(shutdown_rx.clone());

        info!(tasks = self.tasks.len(), "Supervisor running");
        Ok(())
    }

    /// Signal cooperative shutdown and await every task.
    pub async fn shutdown(&mut self) {
        info!("Supervisor shutting down");
        let _ = self.shutdown_tx.send(true);

        for (task_id, handle) in self.tasks.drain() {
            match handle.join.await {
                Ok(context) => {
                    info!(%task_id, state = context.state.name(), "strategy task unwound")
                }
                Err(error) => error!(%task_id, ?error, "strategy task panicked"),
            }
        }

        for handle in self.background.drain(..) {
            handle.abort();
        }
    }

    /// Forward an operator command to a running task.
    pub async fn command(
        &self,
        task_id: &crate::strategy::context::TaskId,
        command: TaskCommand,
    ) -> bool {
        match self.tasks.get(task_id) {
            Some(handle) => handle.command_tx.send(command).await.is_ok(),
            None => false,
        }
    }

    fn spot_exchange(&self) -> Result<ExchangeId, EngineError> {
        self.config
            .arbitrage
            .enabled_exchanges
            .iter()
            .copied()
            .find(|exchange| exchange.market_kind() == MarketDataInstrumentKind::Spot)
            .ok_or(EngineError::Config(crate::error::ConfigError::InvalidValue {
                key: "arbitrage.enabled_exchanges",
                reason: "no spot venue enabled".to_string(),
            }))
    }

    fn futures_exchange(&self) -> Result<ExchangeId, EngineError> {
        self.config
            .arbitrage
            .enabled_exchanges
            .iter()
            .copied()
            .find(|exchange| exchange.market_kind() == MarketDataInstrumentKind::Perpetual)
            .ok_or(EngineError::Config(crate::error::ConfigError::InvalidValue {
                key: "arbitrage.enabled_exchanges",
                reason: "no futures venue enabled".to_string(),
            }))
    }

    fn init_execution_clients(
        &self,
    ) -> Result<HashMap<ExchangeId, Arc<dyn ExecutionClient>>, EngineError> {
        self.config
            .arbitrage
            .enabled_exchanges
            .iter()
            .map(|exchange| {
                let venue_config = self.config.exchanges.get(exchange).ok_or(
                    EngineError::Config(crate::error::ConfigError::MissingKey(
                        "exchanges.<enabled venue>",
                    )),
                )?;

                let credentials = venue_config
                    .credentials
                    .as_ref()
                    .map(|credentials| ApiCredentials {
                        api_key: credentials.api_key.clone(),
                        api_secret: credentials.api_secret.clone(),
                    })
                    .unwrap_or(ApiCredentials {
                        api_key: String::new(),
                        api_secret: String::new(),
                    });

                Ok((*exchange, init_execution_client(*exchange, credentials)))
            })
            .collect()
    }

    /// Attach the venue pair for one instrument, loading `SymbolInfo` from each venue.
    async fn init_exchange_manager(
        &self,
        clients: &HashMap<ExchangeId, Arc<dyn ExecutionClient>>,
        instrument: &MarketDataInstrument,
        spot_exchange: ExchangeId,
        futures_exchange: ExchangeId,
    ) -> Result<ExchangeManager, EngineError> {
        let mut exchanges = HashMap::new();

        for (role, exchange) in [
            (ExchangeRole::Spot, spot_exchange),
            (ExchangeRole::Futures, futures_exchange),
        ] {
            let client = clients
                .get(&exchange)
                .cloned()
                .ok_or(EngineError::Config(crate::error::ConfigError::MissingKey(
                    "exchanges.<enabled venue>",
                )))?;

            let venue_instrument = MarketDataInstrument::new(
                instrument.base.clone(),
                instrument.quote.clone(),
                exchange.market_kind(),
            );

            let symbol_info = client
                .fetch_symbol_info(&venue_instrument)
                .await
                .map_err(|error| EngineError::Execution {
                    venue: exchange,
                    error,
                })?;

            exchanges.insert(
                role,
                ExchangeHandle {
                    exchange,
                    client,
                    symbol_info,
                },
            );
        }

        Ok(ExchangeManager::new(exchanges).with_submission_timeout(Duration::from_millis(
            self.config.arbitrage.target_execution_time_ms,
        )))
    }

    /// Spawn the reconnecting book ticker stream for one venue, feeding the shared cache.
    fn spawn_market_data(&mut self, exchange: ExchangeId, shutdown: watch::Receiver<bool>) {
        let instruments = self
            .config
            .arbitrage
            .enabled_instruments
            .iter()
            .map(|instrument| {
                MarketDataInstrument::new(
                    instrument.base.clone(),
                    instrument.quote.clone(),
                    exchange.market_kind(),
                )
            })
            .collect::<Vec<_>>();

        let cache = Arc::clone(&self.cache);

        let handle = tokio::spawn(async move {
            let mut shutdown = shutdown;
            loop {
                if *shutdown.borrow() {
                    break;
                }

                let result = match exchange {
                    ExchangeId::MexcSpot => {
                        let subscriptions = instruments
                            .iter()
                            .cloned()
                            .map(|instrument| {
                                Subscription::<Mexc, _, _>::new(Mexc, instrument, BookTickers)
                            })
                            .collect();
                        run_ticker_stream::<Mexc>(Arc::clone(&cache), subscriptions).await
                    }
                    ExchangeId::GateioSpot => {
                        let subscriptions = instruments
                            .iter()
                            .cloned()
                            .map(|instrument| {
                                Subscription::<GateioSpot, _, _>::new(
                                    GateioSpot::default(),
                                    instrument,
                                    BookTickers,
                                )
                            })
                            .collect();
                        run_ticker_stream::<GateioSpot>(Arc::clone(&cache), subscriptions).await
                    }
                    ExchangeId::GateioPerpetualsUsd => {
                        let subscriptions = instruments
                            .iter()
                            .cloned()
                            .map(|instrument| {
                                Subscription::<GateioPerpetualsUsd, _, _>::new(
                                    GateioPerpetualsUsd::default(),
                                    instrument,
                                    BookTickers,
                                )
                            })
                            .collect();
                        run_ticker_stream::<GateioPerpetualsUsd>(Arc::clone(&cache), subscriptions)
                            .await
                    }
                    ExchangeId::Mock => {
                        // Mock venues have no public plane
                        return;
                    }
                };

                if let Err(error) = result {
                    warn!(%exchange, ?error, "market data stream failed to initialise - retrying");
                }

                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                    _ = shutdown.changed() => {}
                }
            }
        });

        self.background.push(handle);
    }

    fn spawn_detector(
        &mut self,
        fees: TakerFees,
        routes: HashMap<
            (
                basis_instrument::asset::AssetNameInternal,
                basis_instrument::asset::AssetNameInternal,
            ),
            mpsc::Sender<ArbitrageOpportunity>,
        >,
        shutdown: watch::Receiver<bool>,
    ) {
        let (detector_tx, mut detector_rx) =
            mpsc::channel::<ArbitrageOpportunity>(OPPORTUNITY_CHANNEL_CAPACITY);

        let detector = Arc::new(Detector::new(
            Arc::clone(&self.cache),
            &self.config.arbitrage,
            fees,
            detector_tx,
        ));

        self.background
            .push(tokio::spawn(detector.run(shutdown.clone())));

        // Route emitted opportunities to the strategy task trading that instrument
        let handle = tokio::spawn(async move {
            while let Some(opportunity) = detector_rx.recv().await {
                let key = (
                    opportunity.instrument.base.clone(),
                    opportunity.instrument.quote.clone(),
                );
                match routes.get(&key) {
                    Some(tx) => {
                        if tx.try_send(opportunity).is_err() {
                            // Strategy backlogged or gone; newer opportunities supersede
                        }
                    }
                    None => {
                        warn!(?key, "opportunity for non-configured instrument");
                    }
                }
            }
        });
        self.background.push(handle);
    }

    /// Poll `<state_dir>/control/<task_id>` files for operator pause/resume/cancel
    /// commands written by the CLI.
    fn spawn_control_poller(&mut self, shutdown: watch::Receiver<bool>) {
        let control_dir = self.config.state_dir.join("control");
        let command_txs = self
            .tasks
            .iter()
            .map(|(task_id, handle)| (task_id.clone(), handle.command_tx.clone()))
            .collect::<HashMap<_, _>>();

        let handle = tokio::spawn(async move {
            let mut shutdown = shutdown;
            loop {
                if *shutdown.borrow() {
                    break;
                }

                if let Err(error) = poll_control_dir(&control_dir, &command_txs).await {
                    warn!(?error, "failed to poll operator control directory");
                }

                tokio::select! {
                    _ = tokio::time::sleep(CONTROL_POLL_INTERVAL) => {}
                    _ = shutdown.changed() => {}
                }
            }
        });

        self.background.push(handle);
    }
}

/// Extract detector taker fees (f64 hot path) from the manager's loaded trading rules.
fn manager_taker_fees(manager: &ExchangeManager) -> TakerFees {
    manager
        .roles()
        .filter_map(|role| {
            let handle = manager.get_exchange(role)?;
            Some((
                handle.exchange,
                handle.symbol_info.taker_fee.to_f64().unwrap_or(0.0),
            ))
        })
        .collect()
}

async fn run_ticker_stream<Exchange>(
    cache: Arc<MarketDataCache>,
    subscriptions: Vec<Subscription<Exchange, MarketDataInstrument, BookTickers>>,
) -> Result<(), basis_data::error::DataError>
where
    Exchange: basis_data::exchange::StreamSelector<MarketDataInstrument, BookTickers>
        + Send
        + Sync
        + 'static,
    Subscription<Exchange, MarketDataInstrument, BookTickers>: basis_data::Identifier<Exchange::Channel>
        + basis_data::Identifier<Exchange::Market>,
{
    use basis_data::streams::reconnect::stream::ReconnectingStream;
    use futures_util::StreamExt;

    let stream = init_market_stream(STREAM_RECONNECTION_POLICY, subscriptions)
        .await?
        .with_error_handler(|error| warn!(?error, "MarketStream generated recoverable error"));

    cache.run_tickers(stream.boxed()).await;
    Ok(())
}

async fn poll_control_dir(
    control_dir: &PathBuf,
    command_txs: &HashMap<crate::strategy::context::TaskId, mpsc::Sender<TaskCommand>>,
) -> std::io::Result<()> {
    let mut entries = match tokio::fs::read_dir(control_dir).await {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(error),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(task_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let task_id = crate::strategy::context::TaskId(smol_str::SmolStr::new(task_id));

        let Some(tx) = command_txs.get(&task_id) else {
            warn!(%task_id, "control file for unknown task");
            let _ = tokio::fs::remove_file(&path).await;
            continue;
        };

        let raw = tokio::fs::read_to_string(&path).await?;
        let command = match raw.trim() {
            "pause" => Some(TaskCommand::Pause),
            "resume" => Some(TaskCommand::Resume),
            "cancel" => Some(TaskCommand::Cancel),
            other => {
                warn!(%task_id, command = other, "unrecognised control command");
                None
            }
        };

        if let Some(command) = command {
            info!(%task_id, ?command, "forwarding operator control command");
            let _ = tx.send(command).await;
        }

        let _ = tokio::fs::remove_file(&path).await;
    }

    Ok(())
}
