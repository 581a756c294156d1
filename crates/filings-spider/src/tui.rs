use crate::summary::Summary;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress of one stage over one entity's files: a total bar over successes, skips and
/// failures. Every bar is hidden outside tui mode, so callers never branch on it.
pub(crate) struct StageProgress {
    _multi: Option<MultiProgress>,
    total: ProgressBar,
    success: ProgressBar,
    skip: ProgressBar,
    fail: ProgressBar,
    summary: Summary,
}

impl StageProgress {
    pub(crate) fn new(len: usize, msg: &str, tui: bool) -> anyhow::Result<Self> {
        if !tui {
            return Ok(Self {
                _multi: None,
                total: ProgressBar::hidden(),
                success: ProgressBar::hidden(),
                skip: ProgressBar::hidden(),
                fail: ProgressBar::hidden(),
                summary: Summary::default(),
            });
        }

        // overall multi progress bar
        let multi = MultiProgress::new();

        // total number of files to process
        let total = multi.add(
            ProgressBar::new(len as u64).with_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.magenta}\n \
                        {msg:>9.white} |{bar:57.white/grey}| {pos:<2} / {human_len} \
                        ({percent_precise}%) [Time: {elapsed}, Rate: {per_sec}, ETA: {eta}]",
                    )?
                    .progress_chars("## "),
            ),
        );
        total.set_message(msg.to_string());
        total.enable_steady_tick(Duration::from_millis(100));

        let success = multi.insert_after(&total, counter_bar(len, "successes", "green")?);
        let skip = multi.insert_after(&success, counter_bar(len, "skipped", "yellow")?);
        let fail = multi.insert_after(&skip, counter_bar(len, "failures", "red")?);

        Ok(Self {
            _multi: Some(multi),
            total,
            success,
            skip,
            fail,
            summary: Summary::default(),
        })
    }

    pub(crate) fn succeeded(&mut self) {
        self.summary.succeeded += 1;
        self.success.inc(1);
        self.total.inc(1);
    }

    pub(crate) fn skipped(&mut self) {
        self.summary.skipped += 1;
        self.skip.inc(1);
        self.total.inc(1);
    }

    pub(crate) fn failed(&mut self) {
        self.summary.failed += 1;
        self.fail.inc(1);
        self.total.inc(1);
    }

    /// Clear the bars and hand back the counts.
    pub(crate) fn finish(self) -> Summary {
        for pb in [&self.total, &self.success, &self.skip, &self.fail] {
            pb.finish_and_clear();
        }
        self.summary
    }
}

fn counter_bar(len: usize, msg: &'static str, colour: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64).with_style(
        ProgressStyle::default_bar()
            .template(&format!(
                " {{msg:>9.{colour}}} |{{bar:57.{colour}}}| {{pos:<2.{colour}}}"
            ))?
            .progress_chars("## "),
    );
    pb.set_message(msg);
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_progress_still_counts() {
        let mut progress = StageProgress::new(4, "fetch", false).unwrap();
        progress.succeeded();
        progress.skipped();
        progress.failed();
        progress.failed();

        let summary = progress.finish();
        assert_eq!(
            summary,
            Summary {
                succeeded: 1,
                skipped: 1,
                failed: 2
            }
        );
        assert_eq!(summary.total(), 4);
    }
}
