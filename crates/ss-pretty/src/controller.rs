use crate::{
    config::SessionConfig,
    control::ControlEvent,
    error::AppError,
    source::StatsSource,
};
use ss_pretty_core::{
    json_row, split_records, timestamp, FieldCatalog, FieldSet, OutputFormat, RecordParser,
    TableRenderer, LINE_END,
};
use std::io::{self, Write};
use tokio::{
    sync::mpsc,
    time::{self, Instant},
};
use tracing::{debug, info, warn};

/// Why the loop stopped. Every variant is a clean exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Quit,
    Interrupted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub records: usize,
    pub skipped: usize,
}

pub struct Controller<S, W> {
    config: SessionConfig,
    catalog: FieldCatalog,
    parser: RecordParser,
    source: S,
    out: W,
    verbose: bool,
    end_at: Option<Instant>,
    controls_open: bool,
    clock: fn() -> String,
}

impl<S: StatsSource, W: Write> Controller<S, W> {
    pub fn new(config: SessionConfig, catalog: FieldCatalog, source: S, out: W) -> Self {
        let verbose = config.verbose;
        Self {
            config,
            catalog,
            parser: RecordParser::new(),
            source,
            out,
            verbose,
            end_at: None,
            controls_open: true,
            clock: timestamp::now,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    #[cfg(test)]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }

    pub async fn run(
        &mut self,
        controls: &mut mpsc::Receiver<ControlEvent>,
    ) -> Result<Outcome, AppError> {
        self.end_at = self.config.duration.map(|duration| Instant::now() + duration);
        self.write_header()?;
        self.out.flush()?;

        loop {
            let cycle_start = Instant::now();
            let stats = self.poll_cycle().await?;
            debug!(
                event = "cycle_done",
                records = stats.records,
                skipped = stats.skipped,
                elapsed_ms = cycle_start.elapsed().as_millis() as u64
            );
            if self.expired() {
                return Ok(self.finish(Outcome::Completed));
            }

            let mut deadline = cycle_start + self.config.interval;
            if let Some(end_at) = self.end_at {
                deadline = deadline.min(end_at);
            }
            if let Some(outcome) = self.wait(deadline, controls).await? {
                return Ok(self.finish(outcome));
            }
            if self.expired() {
                return Ok(self.finish(Outcome::Completed));
            }
        }
    }

    /// One poll: run the source, then parse and render every record it printed.
    pub async fn poll_cycle(&mut self) -> Result<CycleStats, AppError> {
        let output = self.source.poll().await?;
        let mut stats = CycleStats::default();
        for record in split_records(&output) {
            stats.records += 1;
            if self.verbose {
                self.echo_raw(record.header, record.detail)?;
            }
            let stamp = (self.clock)();
            match self.parser.parse(&record, &stamp) {
                Ok(fields) => {
                    let line = self.render_row(&fields)?;
                    self.write_line(&line)?;
                }
                Err(err) => {
                    stats.skipped += 1;
                    warn!(event = "record_skipped", error = %err);
                }
            }
        }
        self.out.flush()?;
        Ok(stats)
    }

    async fn wait(
        &mut self,
        deadline: Instant,
        controls: &mut mpsc::Receiver<ControlEvent>,
    ) -> Result<Option<Outcome>, AppError> {
        let sleep = time::sleep_until(deadline);
        tokio::pin!(sleep);
        loop {
            // Queued controls win over a deadline that already passed.
            tokio::select! {
                biased;
                event = controls.recv(), if self.controls_open => match event {
                    Some(event) => {
                        if let Some(outcome) = self.handle_control(event)? {
                            return Ok(Some(outcome));
                        }
                    }
                    None => {
                        debug!(event = "controls_closed");
                        self.controls_open = false;
                    }
                },
                _ = &mut sleep => return Ok(None),
            }
        }
    }

    fn handle_control(&mut self, event: ControlEvent) -> Result<Option<Outcome>, AppError> {
        match event {
            ControlEvent::RepeatHeader => {
                self.write_header()?;
                self.out.flush()?;
                Ok(None)
            }
            ControlEvent::ToggleVerbose => {
                self.verbose = !self.verbose;
                info!(event = "verbose_toggled", verbose = self.verbose);
                Ok(None)
            }
            ControlEvent::Quit => Ok(Some(Outcome::Quit)),
            ControlEvent::Interrupt => Ok(Some(Outcome::Interrupted)),
        }
    }

    fn expired(&self) -> bool {
        self.end_at.is_some_and(|end_at| Instant::now() >= end_at)
    }

    fn finish(&self, outcome: Outcome) -> Outcome {
        info!(event = "session_end", outcome = ?outcome);
        outcome
    }

    fn render_row(&self, fields: &FieldSet) -> io::Result<String> {
        match self.config.format {
            OutputFormat::Table => {
                Ok(TableRenderer::new(&self.catalog).row(&self.config.fields, fields))
            }
            OutputFormat::Json => json_row(&self.config.fields, fields).map_err(io::Error::from),
        }
    }

    fn write_header(&mut self) -> io::Result<()> {
        if self.config.format != OutputFormat::Table {
            return Ok(());
        }
        let header = TableRenderer::new(&self.catalog).header(&self.config.fields);
        self.write_line(&header)
    }

    // Raw lines would break NDJSON output, so JSON mode sends them to the log.
    fn echo_raw(&mut self, header: &str, detail: &str) -> io::Result<()> {
        match self.config.format {
            OutputFormat::Table => {
                self.write_line(header)?;
                self.write_line(detail)
            }
            OutputFormat::Json => {
                info!(event = "raw_record", header, detail);
                Ok(())
            }
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(LINE_END.as_bytes())
    }
}
