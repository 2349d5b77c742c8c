use std::collections::BTreeSet;
use std::path::PathBuf;

use super::data::{CropJob, CropRequest, ImageRef};
use super::geometry::{to_source_rect, DisplayGeometry, DragState, OverlayRect};
use super::queue::{FolderSelection, Queue, QueueResolver};
use crate::codec::ImageCodec;
use crate::error::{CropError, Result};

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No folders configured
    Idle,
    /// Queue computed, nothing loaded yet
    Ready,
    /// Image shown, no drag in progress
    Displaying,
    /// Pointer is down and the selection is tracking it
    Dragging,
    /// A crop has been handed to persistence and is not finished yet
    Saving,
    /// Advanced past the last queued image
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Ready,
    Displaying,
    Dragging(DragState),
    Saving,
    Exhausted,
}

/// The image currently being cropped
#[derive(Debug, Clone)]
pub struct LoadedImage<I> {
    pub image_ref: ImageRef,
    pub image: I,
    pub width: u32,
    pub height: u32,
}

/// What `advance()` ended up doing
#[derive(Debug, Clone, Default)]
pub struct AdvanceReport {
    /// The image now displayed, `None` when the queue ran out
    pub loaded: Option<ImageRef>,
    /// Images passed over because they failed to decode
    pub skipped: Vec<CropError>,
}

/// Result of releasing the pointer, before anything is written
#[derive(Debug)]
pub enum Release<I> {
    /// No drag was in progress
    Ignored,
    /// Zero-area selection; still on the same image
    Rejected,
    /// Crop is ready; the session waits in `Saving` for `finish_crop`
    Pending(CropJob<I>),
}

/// The crop-session state machine.
///
/// Owns the queue snapshot, the cursor into it, the decoded image and the
/// live drag. Every step re-resolves the queue from disk, so files that
/// appear in the output folder behind our back are never offered again.
pub struct CropSession<C: ImageCodec> {
    codec: C,
    folders: FolderSelection,
    resolver: Option<QueueResolver>,
    queue: Queue,
    cursor: isize,
    loaded: Option<LoadedImage<C::Image>>,
    phase: Phase,
    /// Filenames passed over this session (decode failures, explicit skips)
    skipped: BTreeSet<String>,
    can_advance: bool,
}

impl<C: ImageCodec> CropSession<C> {
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            folders: FolderSelection::default(),
            resolver: None,
            queue: Queue::default(),
            cursor: -1,
            loaded: None,
            phase: Phase::Idle,
            skipped: BTreeSet::new(),
            can_advance: false,
        }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Ready => SessionState::Ready,
            Phase::Displaying => SessionState::Displaying,
            Phase::Dragging(_) => SessionState::Dragging,
            Phase::Saving => SessionState::Saving,
            Phase::Exhausted => SessionState::Exhausted,
        }
    }

    pub fn folders(&self) -> &FolderSelection {
        &self.folders
    }

    /// Images left after the one on screen
    pub fn remaining(&self) -> usize {
        (self.queue.len() as isize - self.cursor - 1).max(0) as usize
    }

    /// Whether the begin/continue control should be enabled
    pub fn can_advance(&self) -> bool {
        self.can_advance && self.phase != Phase::Saving
    }

    pub fn is_saving(&self) -> bool {
        self.phase == Phase::Saving
    }

    pub fn loaded(&self) -> Option<&LoadedImage<C::Image>> {
        self.loaded.as_ref()
    }

    pub fn current(&self) -> Option<&ImageRef> {
        self.loaded.as_ref().map(|loaded| &loaded.image_ref)
    }

    pub fn drag(&self) -> Option<&DragState> {
        match &self.phase {
            Phase::Dragging(drag) => Some(drag),
            _ => None,
        }
    }

    /// Rectangle to draw over the preview while dragging
    pub fn overlay(&self) -> Option<OverlayRect> {
        self.drag().map(DragState::overlay)
    }

    // ========== Folders ==========

    pub fn select_input(&mut self, path: impl Into<PathBuf>) -> Result<usize> {
        self.ensure_not_saving()?;
        self.folders.input = Some(path.into());
        self.reconfigure()
    }

    pub fn select_output(&mut self, path: impl Into<PathBuf>) -> Result<usize> {
        self.ensure_not_saving()?;
        self.folders.output = Some(path.into());
        self.reconfigure()
    }

    /// Point the session at a new pair of folders.
    ///
    /// Returns the number of images waiting; zero means nothing to do and
    /// advancing stays disabled.
    pub fn configure_folders(
        &mut self,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Result<usize> {
        self.ensure_not_saving()?;
        self.folders = FolderSelection::new(Some(input.into()), Some(output.into()));
        self.reconfigure()
    }

    fn reconfigure(&mut self) -> Result<usize> {
        let resolver = self.folders.resolver()?;
        let queue = match resolver.resolve() {
            Ok(queue) => queue,
            Err(err) => {
                // Keep the resolver so a later advance retries the same folders
                self.reset(Some(resolver), Queue::default());
                self.phase = Phase::Idle;
                return Err(err);
            }
        };

        log::info!(
            "Configured {} -> {}: {} images to crop",
            resolver.input_dir().display(),
            resolver.output_dir().display(),
            queue.len()
        );

        let count = queue.len();
        self.reset(Some(resolver), queue);
        self.phase = Phase::Ready;
        self.can_advance = count > 0;
        Ok(count)
    }

    /// Folder changes and advancing wait for the pending save
    fn ensure_not_saving(&self) -> Result<()> {
        if self.phase == Phase::Saving {
            return Err(CropError::PersistencePending);
        }
        Ok(())
    }

    fn reset(&mut self, resolver: Option<QueueResolver>, queue: Queue) {
        self.resolver = resolver;
        self.queue = queue;
        self.cursor = -1;
        self.loaded = None;
        self.skipped.clear();
        self.can_advance = false;
    }

    // ========== Advancing ==========

    /// Re-resolve the queue and load the next image.
    ///
    /// The cursor is re-anchored on the fresh snapshot: everything cropped or
    /// skipped so far is already gone from it. Images that fail to decode are
    /// skipped and reported, and the next entry is tried.
    pub fn advance(&mut self) -> Result<AdvanceReport> {
        self.ensure_not_saving()?;

        let queue = self
            .resolver
            .as_ref()
            .ok_or(CropError::Configuration)?
            .resolve()?
            .without(&self.skipped);

        self.queue = queue;
        self.cursor = -1;

        let mut report = AdvanceReport::default();
        loop {
            self.cursor += 1;

            let Some(image_ref) = self.queue.get(self.cursor as usize).cloned() else {
                self.cursor -= 1;
                self.loaded = None;
                self.phase = Phase::Exhausted;
                self.can_advance = false;
                log::info!("No more images to crop");
                return Ok(report);
            };

            match self.codec.decode(&image_ref.path) {
                Ok(image) => {
                    let (width, height) = self.codec.dimensions(&image);
                    log::debug!(
                        "Displaying {} ({}x{}), {} left after it",
                        image_ref.filename,
                        width,
                        height,
                        self.queue.len() as isize - self.cursor - 1
                    );
                    self.loaded = Some(LoadedImage {
                        image_ref: image_ref.clone(),
                        image,
                        width,
                        height,
                    });
                    self.phase = Phase::Displaying;
                    self.can_advance = true;
                    report.loaded = Some(image_ref);
                    return Ok(report);
                }
                Err(err) => {
                    log::warn!("Skipping {}: {}", image_ref.filename, err);
                    self.skipped.insert(image_ref.filename);
                    report.skipped.push(err);
                }
            }
        }
    }

    /// Pass over the displayed image without cropping it
    pub fn skip(&mut self) -> Result<AdvanceReport> {
        self.ensure_not_saving()?;

        if let Some(current) = self.current() {
            log::info!("Skipped {}", current.filename);
            let filename = current.filename.clone();
            self.skipped.insert(filename);
        }

        self.advance()
    }

    // ========== Pointer ==========

    /// Start a selection. Any unfinished selection is dropped.
    pub fn pointer_down(&mut self, x: f32, y: f32) -> bool {
        match self.phase {
            Phase::Displaying | Phase::Dragging(_) if self.loaded.is_some() => {
                self.phase = Phase::Dragging(DragState::new(x, y));
                true
            }
            _ => false,
        }
    }

    /// Track the pointer; returns the rectangle to draw
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<OverlayRect> {
        match &mut self.phase {
            Phase::Dragging(drag) => {
                drag.update(x, y);
                Some(drag.overlay())
            }
            _ => None,
        }
    }

    /// End the drag and turn it into a crop job.
    ///
    /// `surface` must be the size the preview is rendered at right now.
    /// On `Pending` the session sits in `Saving` until `finish_crop`.
    pub fn begin_crop(&mut self, x: f32, y: f32, surface: DisplayGeometry) -> Release<C::Image> {
        let Phase::Dragging(drag) = self.phase else {
            return Release::Ignored;
        };
        self.phase = Phase::Displaying;

        let (Some(loaded), Some(resolver)) = (&self.loaded, &self.resolver) else {
            return Release::Ignored;
        };

        let Some(rect) = to_source_rect(drag.start, (x, y), (loaded.width, loaded.height), surface)
        else {
            log::debug!("{}", CropError::DegenerateCrop);
            return Release::Rejected;
        };

        let request = CropRequest {
            filename: loaded.image_ref.filename.clone(),
            rect,
        };
        let image = self.codec.crop(&loaded.image, rect);
        let destination = resolver.output_dir().join(&request.filename);

        log::debug!("Cropping {} to {}", request.filename, request.rect);

        self.phase = Phase::Saving;
        Release::Pending(CropJob {
            request,
            image,
            destination,
        })
    }

    /// Feed back the persistence result of the pending crop.
    ///
    /// Success advances to the next image. Failure keeps the current image
    /// so the operator can try again. `Ok(None)` means no crop was pending.
    pub fn finish_crop(&mut self, result: Result<()>) -> Result<Option<AdvanceReport>> {
        if self.phase != Phase::Saving {
            log::warn!("Persistence result arrived with no crop pending");
            return Ok(None);
        }
        self.phase = Phase::Displaying;

        if let Err(err) = result {
            log::error!("{}", err);
            return Err(err);
        }

        match self.advance() {
            Ok(report) => Ok(Some(report)),
            Err(err) => {
                // The saved image must not be offered for a second crop
                self.loaded = None;
                self.phase = Phase::Ready;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::SourceRect;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Fake image: only the size matters
    #[derive(Debug, Clone, PartialEq)]
    struct FakeImage {
        width: u32,
        height: u32,
    }

    /// Reads "WxH" text files as images; anything else fails to decode
    #[derive(Clone, Default)]
    struct FakeCodec {
        writes: Rc<RefCell<Vec<(PathBuf, FakeImage)>>>,
        fail_writes: Rc<Cell<bool>>,
    }

    impl ImageCodec for FakeCodec {
        type Image = FakeImage;

        fn decode(&self, path: &Path) -> Result<FakeImage> {
            let text = fs::read_to_string(path)
                .map_err(|e| CropError::decode(path, image::ImageError::IoError(e)))?;
            let parsed = text
                .split_once('x')
                .and_then(|(w, h)| Some((w.trim().parse().ok()?, h.trim().parse().ok()?)));
            match parsed {
                Some((width, height)) => Ok(FakeImage { width, height }),
                None => Err(CropError::decode(
                    path,
                    image::ImageError::IoError(io::Error::new(io::ErrorKind::InvalidData, "garbage")),
                )),
            }
        }

        fn dimensions(&self, image: &FakeImage) -> (u32, u32) {
            (image.width, image.height)
        }

        fn resize(&self, _image: &FakeImage, width: u32, height: u32) -> FakeImage {
            FakeImage { width, height }
        }

        fn crop(&self, _image: &FakeImage, rect: SourceRect) -> FakeImage {
            FakeImage {
                width: rect.width(),
                height: rect.height(),
            }
        }

        fn encode(&self, image: &FakeImage, path: &Path) -> Result<()> {
            if self.fail_writes.get() {
                return Err(CropError::persistence(
                    path,
                    image::ImageError::IoError(io::Error::new(io::ErrorKind::PermissionDenied, "read-only")),
                ));
            }
            fs::write(path, format!("{}x{}", image.width, image.height)).map_err(|e| {
                CropError::persistence(path, image::ImageError::IoError(e))
            })?;
            self.writes.borrow_mut().push((path.to_path_buf(), image.clone()));
            Ok(())
        }
    }

    const BOX: DisplayGeometry = DisplayGeometry { width: 800.0, height: 600.0 };

    /// What a pointer release led to, once the save finished
    #[derive(Debug)]
    enum Released {
        Ignored,
        Rejected,
        Saved {
            request: CropRequest,
            next: AdvanceReport,
        },
    }

    struct Fixture {
        input: TempDir,
        output: TempDir,
        codec: FakeCodec,
        session: CropSession<FakeCodec>,
    }

    impl Fixture {
        fn new(images: &[(&str, &str)]) -> Self {
            let input = TempDir::new().unwrap();
            let output = TempDir::new().unwrap();
            for (name, contents) in images {
                fs::write(input.path().join(name), contents).unwrap();
            }
            let codec = FakeCodec::default();
            let session = CropSession::new(codec.clone());
            Self { input, output, codec, session }
        }

        fn configure(&mut self) -> usize {
            self.session
                .configure_folders(self.input.path(), self.output.path())
                .unwrap()
        }

        fn current(&self) -> Option<&str> {
            self.session.current().map(|image| image.filename.as_str())
        }

        fn queued(&self) -> Vec<&str> {
            (0..self.session.queue.len())
                .filter_map(|i| self.session.queue.get(i))
                .map(|image| image.filename.as_str())
                .collect()
        }

        /// Release the pointer the way the app does: begin the crop, write
        /// the job, then hand the write result back to the session.
        fn release(&mut self, x: f32, y: f32) -> Result<Released> {
            match self.session.begin_crop(x, y, BOX) {
                Release::Ignored => Ok(Released::Ignored),
                Release::Rejected => Ok(Released::Rejected),
                Release::Pending(job) => {
                    assert_eq!(self.session.state(), SessionState::Saving);
                    let written = self.codec.encode(&job.image, &job.destination);
                    let next = self.session.finish_crop(written)?.unwrap_or_default();
                    Ok(Released::Saved {
                        request: job.request,
                        next,
                    })
                }
            }
        }

        fn drag(&mut self, from: (f32, f32), to: (f32, f32)) -> Result<Released> {
            assert!(self.session.pointer_down(from.0, from.1));
            self.release(to.0, to.1)
        }
    }

    #[test]
    fn test_starts_idle() {
        let session = CropSession::new(FakeCodec::default());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.can_advance());
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn test_advance_without_folders_is_configuration_error() {
        let mut session = CropSession::new(FakeCodec::default());
        assert!(matches!(session.advance(), Err(CropError::Configuration)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_single_folder_is_configuration_error() {
        let mut fx = Fixture::new(&[("a.jpg", "10x10")]);
        let input = fx.input.path().to_path_buf();
        assert!(matches!(fx.session.select_input(&input), Err(CropError::Configuration)));
        assert_eq!(fx.session.state(), SessionState::Idle);

        let output = fx.output.path().to_path_buf();
        assert_eq!(fx.session.select_output(&output).unwrap(), 1);
        assert_eq!(fx.session.state(), SessionState::Ready);
    }

    #[test]
    fn test_unreadable_folder_leaves_session_idle() {
        let mut fx = Fixture::new(&[]);
        let missing = fx.input.path().join("gone");
        let output = fx.output.path().to_path_buf();
        assert!(matches!(
            fx.session.configure_folders(&missing, output),
            Err(CropError::DirectoryAccess { .. })
        ));
        assert_eq!(fx.session.state(), SessionState::Idle);
        assert!(!fx.session.can_advance());

        // Advancing retries the chosen folders instead of asking for new ones
        match fx.session.advance() {
            Err(CropError::DirectoryAccess { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected DirectoryAccess, got {:?}", other),
        }

        fs::create_dir(&missing).unwrap();
        fs::write(missing.join("a.jpg"), "10x10").unwrap();
        let report = fx.session.advance().unwrap();
        assert_eq!(report.loaded.unwrap().filename, "a.jpg");
        assert_eq!(fx.session.state(), SessionState::Displaying);
    }

    #[test]
    fn test_empty_queue_disables_advancing() {
        let mut fx = Fixture::new(&[("notes.txt", "1x1")]);
        assert_eq!(fx.configure(), 0);
        assert_eq!(fx.session.state(), SessionState::Ready);
        assert!(!fx.session.can_advance());

        let report = fx.session.advance().unwrap();
        assert!(report.loaded.is_none());
        assert_eq!(fx.session.cursor, -1);
        assert_eq!(fx.session.state(), SessionState::Exhausted);
    }

    #[test]
    fn test_crop_saves_and_moves_on() {
        let mut fx = Fixture::new(&[("a.jpg", "4000x3000"), ("b.jpg", "800x600")]);
        assert_eq!(fx.configure(), 2);
        assert_eq!(fx.session.remaining(), 2);

        fx.session.advance().unwrap();
        assert_eq!(fx.current(), Some("a.jpg"));
        assert_eq!(fx.session.state(), SessionState::Displaying);
        assert_eq!(fx.session.remaining(), 1);

        assert!(fx.session.pointer_down(100.0, 100.0));
        assert_eq!(fx.session.state(), SessionState::Dragging);
        let overlay = fx.session.pointer_move(150.0, 120.0).unwrap();
        assert_eq!((overlay.right, overlay.bottom), (150.0, 120.0));

        let Released::Saved { request, next } = fx.release(200.0, 200.0).unwrap() else {
            panic!("expected a saved crop");
        };
        assert_eq!(request.filename, "a.jpg");
        assert_eq!(
            request.rect,
            SourceRect { left: 500, top: 500, right: 1000, bottom: 1000 }
        );
        assert_eq!(next.loaded.unwrap().filename, "b.jpg");

        let writes = fx.codec.writes.borrow();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, fx.output.path().join("a.jpg"));
        assert_eq!(writes[0].1, FakeImage { width: 500, height: 500 });
        drop(writes);

        assert_eq!(fx.current(), Some("b.jpg"));
        assert_eq!(fx.session.remaining(), 0);
        assert!(fx.session.overlay().is_none());
    }

    #[test]
    fn test_click_without_drag_writes_nothing() {
        let mut fx = Fixture::new(&[("a.jpg", "4000x3000"), ("b.jpg", "10x10")]);
        fx.configure();
        fx.session.advance().unwrap();
        let cursor = fx.session.cursor;

        let released = fx.drag((50.0, 50.0), (50.0, 50.0)).unwrap();
        assert!(matches!(released, Released::Rejected));
        assert!(fx.codec.writes.borrow().is_empty());
        assert_eq!(fx.session.cursor, cursor);
        assert_eq!(fx.current(), Some("a.jpg"));
        assert_eq!(fx.session.state(), SessionState::Displaying);
        assert!(fx.session.drag().is_none());
    }

    #[test]
    fn test_drag_past_canvas_edge_is_clamped() {
        let mut fx = Fixture::new(&[("a.jpg", "1600x1200")]);
        fx.configure();
        fx.session.advance().unwrap();

        let Released::Saved { request, .. } = fx.drag((100.0, 100.0), (900.0, 500.0)).unwrap()
        else {
            panic!("expected a saved crop");
        };
        assert_eq!(
            request.rect,
            SourceRect { left: 200, top: 200, right: 1600, bottom: 1000 }
        );
    }

    #[test]
    fn test_saved_image_is_never_offered_again() {
        let mut fx = Fixture::new(&[("a.jpg", "800x600"), ("b.jpg", "800x600"), ("c.jpg", "800x600")]);
        fx.configure();
        fx.session.advance().unwrap();
        assert_eq!(fx.current(), Some("a.jpg"));

        // Another agent finishes b.jpg while we work on a.jpg
        fs::write(fx.output.path().join("b.jpg"), "done").unwrap();

        let Released::Saved { next, .. } = fx.drag((0.0, 0.0), (400.0, 300.0)).unwrap() else {
            panic!("expected a saved crop");
        };
        assert_eq!(next.loaded.unwrap().filename, "c.jpg");
        assert_eq!(fx.queued(), vec!["c.jpg"]);
    }

    #[test]
    fn test_exhaustion_is_idempotent() {
        let mut fx = Fixture::new(&[("a.jpg", "800x600")]);
        fx.configure();
        fx.session.advance().unwrap();

        let Released::Saved { next, .. } = fx.drag((0.0, 0.0), (800.0, 600.0)).unwrap() else {
            panic!("expected a saved crop");
        };
        assert!(next.loaded.is_none());

        for _ in 0..3 {
            let report = fx.session.advance().unwrap();
            assert!(report.loaded.is_none());
            assert_eq!(fx.session.state(), SessionState::Exhausted);
            assert_eq!(fx.session.cursor, -1);
            assert_eq!(fx.session.remaining(), 0);
            assert!(!fx.session.can_advance());
        }
        assert!(fx.session.current().is_none());
        assert!(!fx.session.pointer_down(10.0, 10.0));
    }

    #[test]
    fn test_new_images_are_picked_up_after_exhaustion() {
        let mut fx = Fixture::new(&[]);
        fx.configure();
        assert!(fx.session.advance().unwrap().loaded.is_none());

        fs::write(fx.input.path().join("late.jpg"), "20x20").unwrap();
        let report = fx.session.advance().unwrap();
        assert_eq!(report.loaded.unwrap().filename, "late.jpg");
        assert_eq!(fx.session.cursor, 0);
    }

    #[test]
    fn test_failed_save_keeps_current_image() {
        let mut fx = Fixture::new(&[("a.jpg", "800x600"), ("b.jpg", "800x600")]);
        fx.configure();
        fx.session.advance().unwrap();

        fx.codec.fail_writes.set(true);
        let err = fx.drag((0.0, 0.0), (400.0, 300.0)).unwrap_err();
        assert!(matches!(err, CropError::Persistence { .. }));
        assert_eq!(fx.current(), Some("a.jpg"));
        assert_eq!(fx.session.state(), SessionState::Displaying);
        assert!(fx.session.drag().is_none());
        assert!(fx.session.can_advance());

        fx.codec.fail_writes.set(false);
        let Released::Saved { next, .. } = fx.drag((0.0, 0.0), (400.0, 300.0)).unwrap() else {
            panic!("expected a saved crop");
        };
        assert_eq!(next.loaded.unwrap().filename, "b.jpg");
    }

    #[test]
    fn test_corrupt_image_is_skipped_and_reported() {
        let mut fx = Fixture::new(&[("a.jpg", "corrupt"), ("b.jpg", "30x30")]);
        fx.configure();

        let report = fx.session.advance().unwrap();
        assert_eq!(report.loaded.as_ref().unwrap().filename, "b.jpg");
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0], CropError::Decode { .. }));
        assert!(fx.session.skipped.contains("a.jpg"));

        // Not offered again within this session
        let report = fx.session.advance().unwrap();
        assert_eq!(report.loaded.unwrap().filename, "b.jpg");
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_skip_passes_over_current_image() {
        let mut fx = Fixture::new(&[("a.jpg", "10x10"), ("b.jpg", "10x10")]);
        fx.configure();
        fx.session.advance().unwrap();

        let report = fx.session.skip().unwrap();
        assert_eq!(report.loaded.unwrap().filename, "b.jpg");
        assert_eq!(fx.session.advance().unwrap().loaded.unwrap().filename, "b.jpg");

        // Picking folders again forgets the skips
        fx.configure();
        assert!(fx.session.skipped.is_empty());
        assert_eq!(fx.session.advance().unwrap().loaded.unwrap().filename, "a.jpg");
    }

    #[test]
    fn test_pending_save_blocks_new_input() {
        let mut fx = Fixture::new(&[("a.jpg", "800x600"), ("b.jpg", "800x600")]);
        fx.configure();
        fx.session.advance().unwrap();

        assert!(fx.session.pointer_down(0.0, 0.0));
        let Release::Pending(job) = fx.session.begin_crop(80.0, 60.0, BOX) else {
            panic!("expected a pending crop");
        };
        assert_eq!(job.destination, fx.output.path().join("a.jpg"));
        assert_eq!(job.image, FakeImage { width: 80, height: 60 });
        assert_eq!(fx.session.state(), SessionState::Saving);

        assert!(!fx.session.pointer_down(5.0, 5.0));
        assert!(!fx.session.can_advance());
        assert!(matches!(fx.session.advance(), Err(CropError::PersistencePending)));
        assert!(matches!(fx.session.skip(), Err(CropError::PersistencePending)));
        let input = fx.input.path().to_path_buf();
        assert!(matches!(
            fx.session.select_input(input),
            Err(CropError::PersistencePending)
        ));

        fx.codec.encode(&job.image, &job.destination).unwrap();
        let report = fx.session.finish_crop(Ok(())).unwrap().unwrap();
        assert_eq!(report.loaded.unwrap().filename, "b.jpg");
        assert_eq!(fx.session.state(), SessionState::Displaying);
    }

    #[test]
    fn test_failed_background_save_returns_to_image() {
        let mut fx = Fixture::new(&[("a.jpg", "800x600")]);
        fx.configure();
        fx.session.advance().unwrap();

        assert!(fx.session.pointer_down(0.0, 0.0));
        let Release::Pending(job) = fx.session.begin_crop(400.0, 300.0, BOX) else {
            panic!("expected a pending crop");
        };
        let failure = CropError::persistence(
            &job.destination,
            image::ImageError::IoError(io::Error::new(io::ErrorKind::Other, "disk full")),
        );

        assert!(matches!(
            fx.session.finish_crop(Err(failure)),
            Err(CropError::Persistence { .. })
        ));
        assert_eq!(fx.current(), Some("a.jpg"));
        assert_eq!(fx.session.state(), SessionState::Displaying);
        assert!(fx.session.pointer_down(10.0, 10.0));
        assert!(!fx.output.path().join("a.jpg").exists());
    }

    #[test]
    fn test_finish_without_pending_crop_is_noop() {
        let mut fx = Fixture::new(&[("a.jpg", "10x10")]);
        fx.configure();
        fx.session.advance().unwrap();

        assert!(fx.session.finish_crop(Ok(())).unwrap().is_none());
        assert_eq!(fx.current(), Some("a.jpg"));
    }

    #[test]
    fn test_pointer_events_need_a_displayed_image() {
        let mut fx = Fixture::new(&[("a.jpg", "10x10")]);
        fx.configure();
        assert!(!fx.session.pointer_down(1.0, 1.0));
        assert!(fx.session.pointer_move(2.0, 2.0).is_none());

        fx.session.advance().unwrap();
        assert!(matches!(fx.release(5.0, 5.0), Ok(Released::Ignored)));
        assert_eq!(fx.session.state(), SessionState::Displaying);
    }

    #[test]
    fn test_new_press_abandons_stale_drag() {
        let mut fx = Fixture::new(&[("a.jpg", "10x10")]);
        fx.configure();
        fx.session.advance().unwrap();

        fx.session.pointer_down(10.0, 10.0);
        fx.session.pointer_move(50.0, 50.0);
        assert!(fx.session.pointer_down(300.0, 300.0));

        let drag = fx.session.drag().unwrap();
        assert_eq!(drag.start, (300.0, 300.0));
        assert_eq!(drag.current, (300.0, 300.0));
    }

    #[test]
    fn test_advance_without_crop_shows_same_image() {
        let mut fx = Fixture::new(&[("a.jpg", "10x10"), ("b.jpg", "10x10")]);
        fx.configure();
        fx.session.advance().unwrap();
        fx.session.advance().unwrap();
        assert_eq!(fx.current(), Some("a.jpg"));
        assert_eq!(fx.session.cursor, 0);
    }
}
