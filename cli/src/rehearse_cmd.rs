use anyhow::Result;
use anyhow::bail;
use async_trait::async_trait;
use clap::Parser;
use clap::ValueEnum;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use tally_core::CountService;
use tally_core::EngineConfig;
use tally_core::ScanEngine;
use tally_core::ServiceError;
use tally_core::SessionAction;
use tally_core::source::WedgeAssembler;
use tally_core::source::WedgeSuffix;
use tally_protocol::CountId;
use tally_protocol::CountLine;
use tally_protocol::Item;
use tally_protocol::ItemId;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::time::Instant;

/// Interactive rehearsal: each stdin line is replayed through the
/// keyboard-wedge assembler as one scanner burst, slash-prefixed lines
/// are session commands, and every engine event is printed to stdout as
/// a JSON line.
#[derive(Debug, Parser)]
pub struct RehearseCli {
    /// Units added per accepted scan (clamped to 1..=10).
    #[arg(long, value_name = "N", default_value_t = 1)]
    qty_per_scan: u32,

    /// Suppress identical re-reads of a code inside this window.
    #[arg(long, value_name = "MS", default_value_t = 500)]
    dedupe_ms: u64,

    /// Pause length after which the pending batch is written out.
    #[arg(long, value_name = "MS", default_value_t = 325)]
    debounce_ms: u64,

    /// Scanning another in-scope item's barcode selects that item.
    #[arg(long)]
    auto_select: bool,

    /// Terminator the wedge scanner appends after each code.
    #[arg(long, value_enum, default_value_t = SuffixArg::Enter)]
    suffix: SuffixArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SuffixArg {
    Enter,
    Tab,
    Both,
}

impl From<SuffixArg> for WedgeSuffix {
    fn from(value: SuffixArg) -> Self {
        match value {
            SuffixArg::Enter => WedgeSuffix::Enter,
            SuffixArg::Tab => WedgeSuffix::Tab,
            SuffixArg::Both => WedgeSuffix::Both,
        }
    }
}

impl SuffixArg {
    /// Keystroke the line terminator stands in for when replaying a
    /// stdin line as a burst.
    fn terminator(self) -> char {
        match self {
            SuffixArg::Enter | SuffixArg::Both => '\n',
            SuffixArg::Tab => '\t',
        }
    }
}

pub async fn run(cli: RehearseCli) -> Result<()> {
    let count_id = CountId::new();
    let (items, lines) = seed_catalog(count_id);
    let service = Arc::new(RehearseService::new(items.clone(), lines.clone()));

    let mut config = EngineConfig::new(count_id);
    config.qty_per_scan = cli.qty_per_scan;
    config.dedupe_window = Duration::from_millis(cli.dedupe_ms);
    config.debounce_window = Duration::from_millis(cli.debounce_ms);
    config.auto_select_by_barcode = cli.auto_select;

    let (engine, mut events) = ScanEngine::new(config, service, items.clone(), lines);

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::warn!("event serialization failed: {err}"),
            }
        }
    });

    print_catalog(&items);
    let mut assembler = WedgeAssembler::new(cli.suffix.into());
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = input.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('/') {
            if let Err(err) = handle_command(command, &engine, &items).await {
                eprintln!("error: {err}");
            }
            continue;
        }
        replay_burst(&engine, &mut assembler, line, cli.suffix.terminator()).await;
    }
    Ok(())
}

/// Feeds one stdin line through the assembler as a single fast burst.
async fn replay_burst(
    engine: &ScanEngine,
    assembler: &mut WedgeAssembler,
    line: &str,
    terminator: char,
) {
    let now = Instant::now();
    for c in line.chars().chain(std::iter::once(terminator)) {
        if let Some(scan) = assembler.push_key(c, now) {
            engine
                .dispatch(SessionAction::ScanDetected { code: scan.code })
                .await;
        }
    }
}

async fn handle_command(command: &str, engine: &ScanEngine, items: &[Item]) -> Result<()> {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("items") => print_catalog(items),
        Some("item") => {
            let index: usize = parse_arg(parts.next(), "/item <index>")?;
            let Some(item) = items.get(index) else {
                bail!("no item at index {index}");
            };
            engine
                .dispatch(SessionAction::ItemSelected { item_id: item.id })
                .await;
        }
        Some("qty") => {
            let qty: u32 = parse_arg(parts.next(), "/qty <n>")?;
            engine.dispatch(SessionAction::SetQtyPerScan { qty }).await;
        }
        Some("set") => {
            let quantity: u32 = parse_arg(parts.next(), "/set <n>")?;
            engine.dispatch(SessionAction::SetActual { quantity }).await;
        }
        Some("status") => {
            let snapshot = engine.snapshot();
            println!("{}", serde_json::to_string(&snapshot)?);
        }
        Some(other) => bail!("unknown command '/{other}'"),
        None => bail!("empty command"),
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(value: Option<&str>, usage: &str) -> Result<T> {
    let Some(raw) = value else {
        bail!("usage: {usage}");
    };
    match raw.parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => bail!("'{raw}' is not valid here; usage: {usage}"),
    }
}

fn print_catalog(items: &[Item]) {
    for (index, item) in items.iter().enumerate() {
        let barcode = item.barcode.as_deref().unwrap_or("-");
        eprintln!("[{index}] {} (barcode: {barcode})", item.name);
    }
}

fn seed_catalog(count_id: CountId) -> (Vec<Item>, Vec<CountLine>) {
    let items = vec![
        Item::new("Olive oil 1L").with_barcode("5000112637922"),
        Item::new("Flour 2kg").with_barcode("4006381333931"),
        Item::new("Tomato passata 700g").with_barcode("8001120810013"),
        // Unlabeled: the first scan against it attaches the code.
        Item::new("House spice mix"),
    ];
    let lines = items
        .iter()
        .enumerate()
        .map(|(index, item)| CountLine::new(count_id, item.id, (index as u32 + 1) * 4))
        .collect();
    (items, lines)
}

/// Local stand-in for the remote count service so a rehearsal needs no
/// backend. Same contract, same additive-bump semantics.
struct RehearseService {
    inner: Mutex<RehearseInner>,
}

struct RehearseInner {
    items: HashMap<ItemId, Item>,
    lines: HashMap<ItemId, CountLine>,
}

impl RehearseService {
    fn new(items: Vec<Item>, lines: Vec<CountLine>) -> Self {
        Self {
            inner: Mutex::new(RehearseInner {
                items: items.into_iter().map(|item| (item.id, item)).collect(),
                lines: lines.into_iter().map(|line| (line.item_id, line)).collect(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RehearseInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl CountService for RehearseService {
    async fn lookup_item_by_barcode(&self, code: &str) -> Result<Option<Item>, ServiceError> {
        Ok(self
            .lock()
            .items
            .values()
            .find(|item| item.barcode.as_deref() == Some(code))
            .cloned())
    }

    async fn bump_actual_quantity(
        &self,
        _count_id: CountId,
        item_id: ItemId,
        delta: u32,
    ) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        let line = inner
            .lines
            .get_mut(&item_id)
            .ok_or_else(|| ServiceError::InvalidIdentifier(item_id.to_string()))?;
        line.confirmed_actual_quantity = Some(line.confirmed() + delta);
        Ok(())
    }

    async fn attach_barcode(&self, item_id: ItemId, code: &str) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        let taken = inner
            .items
            .values()
            .any(|item| item.id != item_id && item.barcode.as_deref() == Some(code));
        if taken {
            return Err(ServiceError::AttachmentConflict(code.to_string()));
        }
        let item = inner
            .items
            .get_mut(&item_id)
            .ok_or_else(|| ServiceError::InvalidIdentifier(item_id.to_string()))?;
        item.barcode = Some(code.to_string());
        Ok(())
    }

    async fn refetch_count_lines(&self, _count_id: CountId) -> Result<Vec<CountLine>, ServiceError> {
        Ok(self.lock().lines.values().cloned().collect())
    }

    async fn set_actual_quantity(
        &self,
        _count_id: CountId,
        item_id: ItemId,
        quantity: u32,
    ) -> Result<(), ServiceError> {
        let mut inner = self.lock();
        let line = inner
            .lines
            .get_mut(&item_id)
            .ok_or_else(|| ServiceError::InvalidIdentifier(item_id.to_string()))?;
        line.confirmed_actual_quantity = Some(quantity);
        Ok(())
    }
}
