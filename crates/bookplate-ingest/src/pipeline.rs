//! Bookplate report pipeline
//!
//! Orchestrates one full run over the export directory:
//! 1. Discover and sequence the `.tar.gz` archives
//! 2. For each archive: extract, read records, detect bookplates, delete the
//!    decompressed file
//! 3. Optionally confirm each bookplate against the discovery site
//! 4. Save bookplates to the JSON store
//! 5. Write the run tracker
//!
//! A failed archive is logged and skipped; the rest of the batch still runs.

use bookplate_common::{BookplateError, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::bookplate::{extract_bookplate, BookplateData};
use crate::config::IngestConfig;
use crate::confirmation::{check_bookplate, Confirmer};
use crate::decompression::extract_archive;
use crate::discovery::{discover_archives, sequence_archives};
use crate::marc::read_marc_file;
use crate::store::BookplateStore;
use crate::tracker::{
    StageTimer, Tracker, STEP_CONFIRMATION, STEP_DISCOVERY, STEP_EXTRACTION, STEP_STORE,
};

/// An archive that could not be processed
#[derive(Debug, Clone)]
pub struct SkippedArchive {
    pub archive: PathBuf,
    pub reason: String,
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub archives_discovered: usize,
    pub archives_processed: usize,
    pub skipped_archives: Vec<SkippedArchive>,
    pub total_records: usize,
    pub malformed_records: usize,
    pub bookplates: Vec<BookplateData>,
    /// mms_ids whose store file could not be written
    pub failed_saves: Vec<String>,
    pub duration_seconds: f64,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed_saves.is_empty()
    }
}

/// Records and bookplates from one archive
struct ArchiveOutcome {
    records: usize,
    malformed: usize,
    bookplates: Vec<BookplateData>,
}

pub struct BookplatePipeline {
    config: IngestConfig,
    confirmer: Option<Box<dyn Confirmer>>,
}

impl BookplatePipeline {
    /// Create a pipeline without discovery-site confirmation
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            confirmer: None,
        }
    }

    /// Create a pipeline that confirms every bookplate it finds
    pub fn with_confirmer(config: IngestConfig, confirmer: Box<dyn Confirmer>) -> Self {
        Self {
            config,
            confirmer: Some(confirmer),
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Run the pipeline over every discovered archive
    ///
    /// Returns an error only for run-level failures (discovery, tracker write).
    /// Failed archives and failed saves are reported in the [`RunReport`].
    pub fn run(&self) -> Result<RunReport> {
        let run_start = Instant::now();
        let mut tracker = Tracker::with_start(run_start);
        let mut report = RunReport::default();

        info!(
            source_dir = %self.config.source_dir.display(),
            pattern = %self.config.archive_pattern,
            "Starting bookplate report run"
        );

        // Step 1: discover archives
        let timer = StageTimer::start(STEP_DISCOVERY);
        let archives = sequence_archives(discover_archives(
            &self.config.source_dir,
            &self.config.archive_pattern,
        )?);
        report.archives_discovered = archives.len();
        tracker.record(STEP_DISCOVERY, "count_targz_files", archives.len());
        timer.finish(&mut tracker);

        info!("Found {} archives in {}", archives.len(), self.config.source_dir.display());

        // Step 2: extract bookplates archive by archive
        let timer = StageTimer::start(STEP_EXTRACTION);
        for (index, archive) in archives.iter().enumerate() {
            debug!(archive = %archive.display(), "Processing archive");

            match self.process_archive(archive) {
                Ok(outcome) => {
                    report.archives_processed += 1;
                    report.total_records += outcome.records;
                    report.malformed_records += outcome.malformed;
                    report.bookplates.extend(outcome.bookplates);
                },
                Err(e) if e.is_archive_local() => {
                    warn!(
                        archive = %archive.display(),
                        error = %e,
                        "Skipping archive (continuing with next archive)"
                    );
                    report.skipped_archives.push(SkippedArchive {
                        archive: archive.clone(),
                        reason: e.to_string(),
                    });
                },
                Err(e) => return Err(e),
            }

            let done = index + 1;
            if done % self.config.progress_interval == 0 || done == archives.len() {
                info!(
                    bookplates = report.bookplates.len(),
                    "Processed {} of {} archives",
                    done,
                    archives.len()
                );
            }
        }

        tracker.record(STEP_EXTRACTION, "count_all_marc_records", report.total_records);
        tracker.record(
            STEP_EXTRACTION,
            "count_records_with_bookplate_data",
            report.bookplates.len(),
        );
        tracker.record(STEP_EXTRACTION, "count_malformed_records", report.malformed_records);
        tracker.record(
            STEP_EXTRACTION,
            "count_skipped_archives",
            report.skipped_archives.len(),
        );
        timer.finish(&mut tracker);

        // Step 3: discovery-site confirmation
        if let Some(confirmer) = &self.confirmer {
            let timer = StageTimer::start(STEP_CONFIRMATION);
            let confirmed = report
                .bookplates
                .iter_mut()
                .map(|bookplate| check_bookplate(confirmer.as_ref(), bookplate))
                .filter(|found| *found)
                .count();
            tracker.record(STEP_CONFIRMATION, "count_checked", report.bookplates.len());
            tracker.record(STEP_CONFIRMATION, "count_confirmed", confirmed);
            timer.finish(&mut tracker);

            info!("Confirmed {} of {} bookplates", confirmed, report.bookplates.len());
        }

        tracker.record(STEP_EXTRACTION, "extracted_bookplate_data", &report.bookplates);

        // Step 4: persist bookplates
        let timer = StageTimer::start(STEP_STORE);
        let store = BookplateStore::new(&self.config.bookplate_dir);
        let mut saved = 0usize;
        for bookplate in &report.bookplates {
            match store.save(bookplate) {
                Ok(_) => saved += 1,
                Err(e) => {
                    error!(mms_id = %bookplate.mms_id, error = %e, "Failed to save bookplate data");
                    report.failed_saves.push(bookplate.mms_id.clone());
                },
            }
        }
        tracker.record(STEP_STORE, "count_saved", saved);
        tracker.record(STEP_STORE, "count_failed_saves", report.failed_saves.len());
        timer.finish(&mut tracker);

        // Step 5: tracker
        let tracker_report = tracker.finalize();
        tracker_report.persist(&self.config.tracker_path)?;
        report.duration_seconds = tracker_report.elapsed_total_time;

        info!(
            archives = report.archives_processed,
            skipped = report.skipped_archives.len(),
            records = report.total_records,
            bookplates = report.bookplates.len(),
            failed_saves = report.failed_saves.len(),
            "Bookplate report run complete in {:.2}s",
            report.duration_seconds
        );

        Ok(report)
    }

    /// Extract, read, and scan one archive
    ///
    /// The decompressed file is deleted before returning, whatever happened
    /// while reading it.
    fn process_archive(&self, archive: &Path) -> Result<ArchiveOutcome> {
        let extracted = extract_archive(archive, &self.config.output_dir)?;
        let records = read_marc_file(extracted.path())?;

        let mut outcome = ArchiveOutcome {
            records: records.len(),
            malformed: 0,
            bookplates: Vec::new(),
        };

        for record in &records {
            match extract_bookplate(record) {
                Ok(Some(bookplate)) => outcome.bookplates.push(bookplate),
                Ok(None) => {},
                Err(e @ BookplateError::MalformedRecord(_)) => {
                    warn!(archive = %archive.display(), error = %e, "Skipping malformed record");
                    outcome.malformed += 1;
                },
                Err(e) => return Err(e),
            }
        }

        if let Err(e) = extracted.remove() {
            warn!(archive = %archive.display(), error = %e, "Failed to delete decompressed file");
        }

        debug!(
            archive = %archive.display(),
            records = outcome.records,
            bookplates = outcome.bookplates.len(),
            "Archive processed"
        );
        Ok(outcome)
    }
}
