use anyhow::Result;

pub struct ClipboardService {}

impl ClipboardService {
    pub fn healthcheck() -> Result<()> {
        arboard::Clipboard::new()?;
        return Ok(());
    }

    pub fn set(text: String) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text)?;

        return Ok(());
    }
}
