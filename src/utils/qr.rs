use qrcode::QrCode;
use qrcode::render::svg;

/// Renders a scannable QR code for `payload` as standalone SVG markup.
pub fn render_svg(payload: &str) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(payload.as_bytes())?;
    Ok(code
        .render()
        .min_dimensions(200, 200)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_svg_markup() {
        let svg = render_svg("K7Q2M9XA").unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#000000"));
    }

    #[test]
    fn different_ids_render_differently() {
        assert_ne!(render_svg("AAAA1111").unwrap(), render_svg("BBBB2222").unwrap());
    }
}
