use crossterm::event::{KeyCode, KeyEvent};
use std::path::PathBuf;

use crate::pane::Side;

use super::types::*;
use super::App;

impl App {
    pub(crate) fn open_prompt(&mut self, side: Side) {
        self.prompt = Some(PathPrompt::new(side, self.session.file(side)));
    }

    pub(crate) fn handle_prompt_input(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Enter => {
                let Some(prompt) = self.prompt.take() else {
                    return;
                };
                let input = prompt.input.trim();
                // 空の場合はキャンセル扱い
                if input.is_empty() {
                    return;
                }
                self.select_file(prompt.side, PathBuf::from(input));
            }
            KeyCode::Esc => self.prompt = None,
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Char(c) => prompt.input.push(c),
            _ => {}
        }
    }
}
