//! Generic starting layouts, one per document kind.

use super::*;

fn text(id: &str, rect: Rect, content: &str, font_size: f64, bold: bool, align: TextAlign) -> PrintableElement {
    PrintableElement::new(
        id,
        rect,
        ElementKind::Text {
            content: content.to_string(),
            font_size,
            font_weight: if bold { FontWeight::Bold } else { FontWeight::Normal },
            align,
        },
    )
}

pub(super) fn generic_template(kind: DocumentKind) -> DocumentTemplate {
    let p = kind.as_str();
    let mut elements = vec![
        text(&format!("{p}-clinic"), Rect::new(5.0, 3.0, 90.0, 6.0), "{{CLINIC_NAME}}", 22.0, true, TextAlign::Center),
        text(
            &format!("{p}-doctor"),
            Rect::new(5.0, 9.0, 90.0, 4.0),
            "{{DOCTOR_NAME}} - {{SPECIALTY}}",
            14.0,
            false,
            TextAlign::Center,
        ),
        text(
            &format!("{p}-patient"),
            Rect::new(5.0, 15.0, 90.0, 4.0),
            "Name: {{PATIENT_NAME}}    Age: {{AGE}}    Date: {{DATE}}",
            12.0,
            false,
            TextAlign::Left,
        ),
    ];

    let block_top = if kind == DocumentKind::Rx {
        elements.push(text(
            "rx-vitals",
            Rect::new(5.0, 19.0, 90.0, 4.0),
            "BP: {{BP}}  HR: {{HR}}  Temp: {{TEMP}}  Wt: {{WEIGHT}}  Ht: {{HEIGHT}}",
            11.0,
            false,
            TextAlign::Left,
        ));
        25.0
    } else {
        21.0
    };

    elements.push(PrintableElement::data_block(
        format!("{p}-data"),
        Rect::new(5.0, block_top, 90.0, 88.0 - block_top),
    ));
    elements.push(text(
        &format!("{p}-footer"),
        Rect::new(5.0, 92.0, 90.0, 5.0),
        "{{PHONES}}\n{{ADDRESSES}}",
        10.0,
        false,
        TextAlign::Center,
    ));

    DocumentTemplate {
        paper_size: kind.default_paper_size(),
        background_url: None,
        elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_layouts_fit_on_page() {
        for kind in DocumentKind::ALL {
            let tpl = generic_template(kind);
            assert!(tpl.elements.iter().all(|e| e.rect.is_within_page()), "{kind}");
        }
    }

    #[test]
    fn test_generic_ids_are_unique() {
        for kind in DocumentKind::ALL {
            let tpl = generic_template(kind);
            let mut ids: Vec<&str> = tpl.elements.iter().map(|e| e.id.as_str()).collect();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), tpl.elements.len());
        }
    }

    #[test]
    fn test_only_rx_has_vitals_line() {
        assert!(generic_template(DocumentKind::Rx).element("rx-vitals").is_some());
        assert!(generic_template(DocumentKind::Reports).element("reports-vitals").is_none());
    }
}
