// src/main.rs
use iced::widget::{
    button, column, container, row, scrollable, text, text_input, Column, Row, Space, TextInput,
};
use iced::{
    executor, window, Alignment, Application, Background, Border, Color, Command, Element, Length,
    Settings, Shadow, Size, Theme,
};

use chrono::Local;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use sharetable::data_types::{ExportOutcome, ShareOptions};
use sharetable::render_region::{build_print_region, RegionRegistry, PRINT_REGION_ID};
use sharetable::share_handler::export_and_share;
use sharetable::storage_handler::StorageHandler;
use sharetable::table_state::TableManager;
use sharetable::ui::{Styles, LIGHT_THEME};

const VERSION: &str = "1.2.0";
const DOC_TITLE: &str = "Inventory";
const EXPORT_FILENAME: &str = "inventory.pdf";
const CELL_WIDTH: f32 = 160.0;

pub fn main() -> iced::Result {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    ShareTable::run(Settings {
        window: window::Settings {
            size: Size::new(1024.0, 768.0),
            ..Default::default()
        },
        ..Settings::default()
    })
}

struct ShareTable {
    styles: &'static Styles,
    manager: TableManager,
    is_sharing: bool,
    status: Option<String>,
}

#[derive(Debug, Clone)]
enum Message {
    AddRow,
    RemoveRow,
    AddColumn,
    RemoveColumn,
    HeaderEdited(usize, String),
    CellEdited(usize, usize, String),
    SharePressed,
    ShareFinished(Result<ExportOutcome, String>),
}

impl Application for ShareTable {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = ();

    fn new(_flags: ()) -> (Self, Command<Message>) {
        let storage = StorageHandler::new();
        let mut manager = TableManager::load(&storage);
        manager.subscribe(Box::new(storage));

        (
            ShareTable {
                styles: &LIGHT_THEME,
                manager,
                is_sharing: false,
                status: None,
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        format!("ShareTable v{}", VERSION)
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::AddRow => {
                self.manager.add_row();
                Command::none()
            }

            Message::RemoveRow => {
                self.manager.remove_row();
                Command::none()
            }

            Message::AddColumn => {
                self.manager.add_column();
                Command::none()
            }

            Message::RemoveColumn => {
                self.manager.remove_column();
                Command::none()
            }

            Message::HeaderEdited(index, value) => {
                self.manager.set_header(index, value);
                Command::none()
            }

            Message::CellEdited(row, col, value) => {
                self.manager.set_cell(row, col, value);
                Command::none()
            }

            Message::SharePressed => {
                if self.is_sharing {
                    return Command::none();
                }
                self.is_sharing = true;
                self.status = None;

                let subtitle = format!("Exported {}", Local::now().format("%Y-%m-%d"));
                let mut registry = RegionRegistry::new();
                registry.register(build_print_region(self.manager.state(), DOC_TITLE, &subtitle));
                let options = ShareOptions {
                    filename: EXPORT_FILENAME.to_string(),
                    title: DOC_TITLE.to_string(),
                    text: "Here is a PDF of the table you created.".to_string(),
                };

                Command::perform(
                    export_and_share(registry, PRINT_REGION_ID.to_string(), options),
                    |result| Message::ShareFinished(result.map_err(|e| e.to_string())),
                )
            }

            Message::ShareFinished(result) => {
                self.is_sharing = false;
                match result {
                    Ok(ExportOutcome::Shared) => {
                        self.status = Some("PDF shared.".to_string());
                    }
                    Ok(ExportOutcome::Downloaded(path)) => {
                        self.status = Some(format!("PDF saved to {}", path.display()));
                    }
                    Ok(ExportOutcome::Cancelled) => {
                        self.status = None;
                    }
                    Err(message) => {
                        log::error!("export failed: {message}");
                        self.status = Some(
                            "An error occurred while creating the PDF. Please try again."
                                .to_string(),
                        );
                    }
                }
                Command::none()
            }
        }
    }

    fn view(&self) -> Element<Message> {
        let mut page = column![self.toolbar()].spacing(12).padding(16);

        if let Some(status) = &self.status {
            page = page.push(
                text(status)
                    .size(13)
                    .style(iced::theme::Text::Color(self.styles.muted_fg)),
            );
        }

        page = page
            .push(
                scrollable(self.printable_panel())
                    .direction(scrollable::Direction::Both {
                        vertical: scrollable::Properties::default(),
                        horizontal: scrollable::Properties::default(),
                    })
                    .height(Length::Fill),
            )
            .push(
                text("Changes are saved automatically on this device.")
                    .size(12)
                    .style(iced::theme::Text::Color(self.styles.muted_fg)),
            );

        let content = container(page)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(iced::theme::Container::Custom(Box::new(ContainerStyle {
                bg: self.styles.bg,
            })));

        column![content, self.footer()].into()
    }
}

impl ShareTable {
    fn toolbar(&self) -> Element<Message> {
        let state = self.manager.state();
        let share_label = if self.is_sharing {
            "Preparing..."
        } else {
            "Share as PDF"
        };

        row![
            self.action_button("Add row", self.styles.accent, Some(Message::AddRow)),
            self.action_button(
                "Remove row",
                self.styles.danger,
                (!state.rows.is_empty()).then_some(Message::RemoveRow),
            ),
            self.action_button("Add column", self.styles.accent, Some(Message::AddColumn)),
            self.action_button(
                "Remove column",
                self.styles.danger,
                (state.headers.len() > 1).then_some(Message::RemoveColumn),
            ),
            Space::with_width(Length::Fill),
            self.action_button(
                share_label,
                self.styles.accent,
                (!self.is_sharing).then_some(Message::SharePressed),
            ),
        ]
        .spacing(8)
        .into()
    }

    fn action_button(&self, label: &str, bg: Color, on_press: Option<Message>) -> Element<Message> {
        button(
            text(label)
                .size(14)
                .style(iced::theme::Text::Color(self.styles.accent_fg)),
        )
        .padding([6.0, 12.0])
        .on_press_maybe(on_press)
        .style(iced::theme::Button::Custom(Box::new(ButtonStyle {
            bg,
            fg: self.styles.accent_fg,
            hover_bg: shade(bg),
        })))
        .into()
    }

    fn printable_panel(&self) -> Element<Message> {
        let state = self.manager.state();

        let header_cells = state
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.grid_cell(
                    text_input("Column name", header)
                        .on_input(move |value| Message::HeaderEdited(i, value)),
                    self.styles.header_bg,
                )
            })
            .collect::<Vec<_>>();

        let mut grid = Column::new().push(Row::with_children(header_cells));
        for (r, cells) in state.rows.iter().enumerate() {
            let row_cells = cells
                .iter()
                .enumerate()
                .map(|(c, value)| {
                    self.grid_cell(
                        text_input("", value)
                            .on_input(move |value| Message::CellEdited(r, c, value)),
                        self.styles.panel_bg,
                    )
                })
                .collect::<Vec<_>>();
            grid = grid.push(Row::with_children(row_cells));
        }

        let mut panel = column![
            text(DOC_TITLE)
                .size(26)
                .style(iced::theme::Text::Color(self.styles.fg)),
            text("Click a cell to edit.")
                .size(13)
                .style(iced::theme::Text::Color(self.styles.muted_fg)),
            grid,
        ]
        .spacing(12)
        .align_items(Alignment::Center);

        if state.rows.is_empty() {
            panel = panel.push(
                text("The table is empty. Add rows to get started.")
                    .size(13)
                    .style(iced::theme::Text::Color(self.styles.muted_fg)),
            );
        }

        container(panel)
            .padding(24)
            .style(iced::theme::Container::Custom(Box::new(CardStyle {
                bg: self.styles.panel_bg,
                border: self.styles.grid_line,
            })))
            .into()
    }

    fn grid_cell<'a>(&self, input: TextInput<'a, Message>, bg: Color) -> Element<'a, Message> {
        container(input.size(14).padding(6))
            .width(Length::Fixed(CELL_WIDTH))
            .padding(1)
            .style(iced::theme::Container::Custom(Box::new(CellStyle {
                bg,
                border: self.styles.grid_line,
            })))
            .into()
    }

    fn footer(&self) -> Element<Message> {
        container(
            row![text(format!(
                "ShareTable © {} v{}",
                Local::now().format("%Y"),
                VERSION
            ))
            .size(13)
            .style(iced::theme::Text::Color(self.styles.footer_fg))]
            .padding(10),
        )
        .width(Length::Fill)
        .style(iced::theme::Container::Custom(Box::new(ContainerStyle {
            bg: self.styles.footer_bg,
        })))
        .into()
    }
}

fn shade(color: Color) -> Color {
    Color::from_rgba(color.r * 0.85, color.g * 0.85, color.b * 0.85, color.a)
}

// Custom styles for containers and buttons
struct ContainerStyle {
    bg: Color,
}

impl container::StyleSheet for ContainerStyle {
    type Style = Theme;

    fn appearance(&self, _style: &Theme) -> container::Appearance {
        container::Appearance {
            text_color: None,
            background: Some(Background::Color(self.bg)),
            border: Border::default(),
            shadow: Shadow::default(),
        }
    }
}

struct CardStyle {
    bg: Color,
    border: Color,
}

impl container::StyleSheet for CardStyle {
    type Style = Theme;

    fn appearance(&self, _style: &Theme) -> container::Appearance {
        container::Appearance {
            text_color: None,
            background: Some(Background::Color(self.bg)),
            border: Border {
                color: self.border,
                width: 1.0,
                radius: 8.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}

struct CellStyle {
    bg: Color,
    border: Color,
}

impl container::StyleSheet for CellStyle {
    type Style = Theme;

    fn appearance(&self, _style: &Theme) -> container::Appearance {
        container::Appearance {
            text_color: None,
            background: Some(Background::Color(self.bg)),
            border: Border {
                color: self.border,
                width: 1.0,
                radius: 0.0.into(),
            },
            shadow: Shadow::default(),
        }
    }
}

struct ButtonStyle {
    bg: Color,
    fg: Color,
    hover_bg: Color,
}

impl button::StyleSheet for ButtonStyle {
    type Style = Theme;

    fn active(&self, _style: &Theme) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.bg)),
            text_color: self.fg,
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 6.0.into(),
            },
            ..button::Appearance::default()
        }
    }

    fn hovered(&self, style: &Theme) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.hover_bg)),
            ..self.active(style)
        }
    }
}
