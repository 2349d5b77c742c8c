use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, LineDash, Path, Program, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use crate::state::OverlayRect;
use crate::Message;

/// Outline of the live selection
const SELECTION_COLOR: Color = Color::from_rgb(1.0, 0.341, 0.2);
/// Translucent fill inside the selection
const SELECTION_FILL: Color = Color::from_rgba(0.5, 0.5, 0.5, 0.25);
const SELECTION_WIDTH: f32 = 2.0;
const SELECTION_DASH: [f32; 2] = [5.0, 2.0];

/// Transparent layer over the preview: forwards pointer events in
/// display-surface coordinates and draws the drag rectangle.
pub struct SelectionCanvas {
    /// Rectangle to draw, if a drag is in progress
    pub overlay: Option<OverlayRect>,
    /// Whether a press may start a selection (image shown, no save pending)
    pub active: bool,
}

impl Program<Message> for SelectionCanvas {
    type State = PointerState;

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        if let Some(rect) = self.overlay {
            let path = Path::rectangle(
                Point::new(rect.left, rect.top),
                Size::new(rect.width(), rect.height()),
            );
            frame.fill(&path, SELECTION_FILL);
            frame.stroke(
                &path,
                Stroke {
                    line_dash: LineDash {
                        segments: &SELECTION_DASH,
                        offset: 0,
                    },
                    ..Stroke::default()
                        .with_color(SELECTION_COLOR)
                        .with_width(SELECTION_WIDTH)
                },
            );
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        match event {
            // Press inside the box starts a selection
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if !self.active {
                    return (canvas::event::Status::Ignored, None);
                }
                if let Some(pos) = cursor.position_in(bounds) {
                    state.pressed = true;
                    state.last_position = pos;
                    return (canvas::event::Status::Captured, Some(Message::PointerDown(pos)));
                }
            }

            // Keep tracking outside the box; the session clamps on release
            canvas::Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.pressed {
                    let pos = relative_to(bounds, position);
                    state.last_position = pos;
                    return (canvas::event::Status::Captured, Some(Message::PointerMoved(pos)));
                }
            }

            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.pressed {
                    state.pressed = false;
                    let position = cursor
                        .position()
                        .map(|p| relative_to(bounds, p))
                        .unwrap_or(state.last_position);
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::PointerUp {
                            position,
                            surface: bounds.size(),
                        }),
                    );
                }
            }

            _ => {}
        }

        (canvas::event::Status::Ignored, None)
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> mouse::Interaction {
        if self.active && cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Pointer tracking local to the canvas widget
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    pub pressed: bool,
    pub last_position: Point,
}

fn relative_to(bounds: Rectangle, position: Point) -> Point {
    Point::new(position.x - bounds.x, position.y - bounds.y)
}
