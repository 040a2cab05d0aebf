use qrcode::QrCode;
use qrcode::render::unicode;
use qrcode::types::QrError;

/// Renders a login QR payload as half-block characters for a dark terminal.
pub fn render_qr(payload: &str) -> Result<String, QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_multiline_block() {
        let rendered = render_qr("2@Yx3kq8b1,ZmFrZS1ub2lzZQ==,aWRlbnRpdHk=,YWR2").unwrap();
        assert!(rendered.lines().count() > 10);
        assert!(rendered.chars().any(|c| c == '█' || c == '▀' || c == '▄'));
    }
}
