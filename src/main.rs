use clap::Parser;
use iced::widget::{button, canvas, column, container, image, row, stack, text, Column};
use iced::{Alignment, ContentFit, Element, Length, Point, Size, Task, Theme};
use std::io;

mod codec;
mod config;
mod error;
mod state;
mod ui;

use codec::{ImageCodec, RasterCodec, RasterImage};
use config::{AppConfig, Args};
use error::CropError;
use state::{AdvanceReport, CropJob, CropSession, DisplayGeometry, Release, SessionState};
use ui::{FolderPicker, NativeFolderPicker, SelectionCanvas};

/// Main application state
struct SpaceCropper {
    /// The crop session state machine
    session: CropSession<RasterCodec>,
    /// Display box size and remembered folders
    config: AppConfig,
    /// Folder dialogs
    picker: Box<dyn FolderPicker>,
    /// Current image stretched to the display box
    preview: Option<image::Handle>,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User clicked "Select Input Folder"
    SelectInputFolder,
    /// User clicked "Select Output Folder"
    SelectOutputFolder,
    /// User clicked "Begin"/"Continue"
    Begin,
    /// User clicked "Skip"
    Skip,
    /// Pointer pressed on the display box
    PointerDown(Point),
    /// Pointer moved while pressed
    PointerMoved(Point),
    /// Pointer released; `surface` is the box size at that moment
    PointerUp { position: Point, surface: Size },
    /// Background save finished
    CropSaved(Result<(), CropError>),
}

impl SpaceCropper {
    /// Create the application, reopening the last folders if there are any
    fn new(config: AppConfig) -> (Self, Task<Message>) {
        let mut app = SpaceCropper {
            session: CropSession::new(RasterCodec),
            config,
            picker: Box::new(NativeFolderPicker),
            preview: None,
            status: "Select input and output folders to start.".to_string(),
        };

        if let (Some(input), Some(output)) =
            (app.config.last_input.clone(), app.config.last_output.clone())
        {
            let result = app.session.configure_folders(input, output);
            app.on_configured(result);
        }

        (app, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectInputFolder => {
                let start = self.config.last_input.clone();
                if let Some(folder) = self.picker.pick_folder("Select Input Folder", start.as_deref()) {
                    self.config.last_input = Some(folder.clone());
                    self.save_config();
                    let result = self.session.select_input(folder);
                    self.on_configured(result);
                }
                Task::none()
            }
            Message::SelectOutputFolder => {
                let start = self.config.last_output.clone();
                if let Some(folder) = self.picker.pick_folder("Select Output Folder", start.as_deref()) {
                    self.config.last_output = Some(folder.clone());
                    self.save_config();
                    let result = self.session.select_output(folder);
                    self.on_configured(result);
                }
                Task::none()
            }
            Message::Begin => {
                let result = self.session.advance();
                self.on_advanced(result);
                Task::none()
            }
            Message::Skip => {
                let result = self.session.skip();
                self.on_advanced(result);
                Task::none()
            }
            Message::PointerDown(pos) => {
                self.session.pointer_down(pos.x, pos.y);
                Task::none()
            }
            Message::PointerMoved(pos) => {
                self.session.pointer_move(pos.x, pos.y);
                Task::none()
            }
            Message::PointerUp { position, surface } => {
                let surface = DisplayGeometry::new(surface.width, surface.height);
                match self.session.begin_crop(position.x, position.y, surface) {
                    Release::Ignored => Task::none(),
                    Release::Rejected => {
                        self.status = CropError::DegenerateCrop.to_string();
                        Task::none()
                    }
                    Release::Pending(job) => {
                        self.status =
                            format!("Saving {} {}...", job.request.filename, job.request.rect);
                        Task::perform(save_crop_async(job), Message::CropSaved)
                    }
                }
            }
            Message::CropSaved(result) => {
                match self.session.finish_crop(result) {
                    Ok(Some(report)) => self.on_advanced(Ok(report)),
                    Ok(None) => {}
                    Err(e) => self.on_advanced(Err(e)),
                }
                Task::none()
            }
        }
    }

    /// Update status after the folders changed
    fn on_configured(&mut self, result: error::Result<usize>) {
        self.preview = None;
        self.status = match result {
            Ok(0) => "No uncropped images found.".to_string(),
            Ok(count) => format!("{} images to crop. Press Begin.", count),
            Err(CropError::Configuration) => match self.session.folders().input {
                Some(_) => "Now select the output folder.".to_string(),
                None => "Now select the input folder.".to_string(),
            },
            Err(e) => {
                log::error!("{}", e);
                e.to_string()
            }
        };
    }

    /// Refresh preview and status after the session moved
    fn on_advanced(&mut self, result: error::Result<AdvanceReport>) {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                log::error!("{}", e);
                self.status = e.to_string();
                if self.session.current().is_none() {
                    self.preview = None;
                }
                return;
            }
        };

        self.preview = self.session.loaded().map(|loaded| {
            ui::preview_handle(
                self.session.codec(),
                &loaded.image,
                self.config.display_width,
                self.config.display_height,
            )
        });

        let mut status = match &report.loaded {
            Some(image) => format!("Cropping {}", image.filename),
            None => "No more images to crop.".to_string(),
        };
        if !report.skipped.is_empty() {
            status.push_str(&format!(
                " (skipped {} unreadable image(s): {})",
                report.skipped.len(),
                report
                    .skipped
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            ));
        }
        self.status = status;
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            log::warn!("Could not save config: {}", e);
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let display: Element<'_, Message> = match &self.preview {
            Some(handle) => stack![
                image(handle.clone())
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .content_fit(ContentFit::Fill),
                canvas(SelectionCanvas {
                    overlay: self.session.overlay(),
                    active: !self.session.is_saving(),
                })
                .width(Length::Fill)
                .height(Length::Fill),
            ]
            .into(),
            None => container(text("Select folders, then press Begin").size(16))
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        };

        let display_box = container(display)
            .width(Length::Fixed(self.config.display_width as f32))
            .height(Length::Fixed(self.config.display_height as f32))
            .style(container::dark);

        let idle = !self.session.is_saving();
        let begin_label = match self.session.state() {
            SessionState::Idle | SessionState::Ready => "Begin",
            _ => "Continue",
        };

        let controls = row![
            button("Select Input Folder")
                .on_press_maybe(idle.then_some(Message::SelectInputFolder))
                .padding(10),
            button("Select Output Folder")
                .on_press_maybe(idle.then_some(Message::SelectOutputFolder))
                .padding(10),
            button(begin_label)
                .on_press_maybe(self.session.can_advance().then_some(Message::Begin))
                .style(button::success)
                .padding(10),
            button("Skip")
                .on_press_maybe(
                    (idle && self.session.current().is_some()).then_some(Message::Skip),
                )
                .style(button::secondary)
                .padding(10),
        ]
        .spacing(10);

        let content: Column<'_, Message> = column![
            display_box,
            text(format!("Images Left: {}", self.session.remaining())).size(14),
            controls,
            text(&self.status).size(14),
        ]
        .spacing(12)
        .padding(20)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Encode the crop on a blocking worker so the UI keeps drawing
async fn save_crop_async(job: CropJob<RasterImage>) -> Result<(), CropError> {
    let destination = job.destination.clone();

    tokio::task::spawn_blocking(move || RasterCodec.encode(&job.image, &job.destination))
        .await
        .map_err(|e| CropError::persistence(destination, image_io_error(e)))?
}

fn image_io_error(e: tokio::task::JoinError) -> ::image::ImageError {
    ::image::ImageError::IoError(io::Error::new(io::ErrorKind::Other, e.to_string()))
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = AppConfig::load().with_args(&args);

    log::info!(
        "Space Cropper starting ({}x{} display box)",
        config.display_width,
        config.display_height
    );

    let window = Size::new(
        config.display_width as f32 + 80.0,
        config.display_height as f32 + 220.0,
    );

    iced::application("Space Image Cropper", SpaceCropper::update, SpaceCropper::view)
        .theme(SpaceCropper::theme)
        .window_size(window)
        .centered()
        .run_with(move || SpaceCropper::new(config))
}
