//! Invoice → sheet layout.
//!
//! Lays out the invoice page (header, client block, item table, totals,
//! notes, signature, footer) and, when the client accepted them, a second
//! page carrying the general sale terms. The page grows below A4 height
//! when content overflows; the document assembler scales whatever height
//! it receives back onto an A4 page.

use crate::invoice::format::{format_date, format_eur, format_percent};
use crate::invoice::types::{Discount, Invoice, LineItem};
use crate::invoice::CompanyInfo;

use super::notes::{parse_notes, NoteBlock, NOTES_BODY_SIZE};
use super::{
    text_width, wrap_text, Frame, ImageSlot, Rule, Sheet, SheetElement, TextAnchor, TextRun,
    A4_HEIGHT_PX,
};

// ============================================================================
// LAYOUT CONSTANTS
// ============================================================================

const MARGIN: f32 = 40.0;
const CONTENT_RIGHT: f32 = 754.0;
const CONTENT_WIDTH: f32 = CONTENT_RIGHT - MARGIN;

/// Brand ink used for the masthead, table header and total line.
const BRAND_GREEN: [u8; 3] = [71, 122, 12];
const INK: [u8; 3] = [20, 20, 20];
const MUTED: [u8; 3] = [110, 110, 110];
const RULE_GRAY: [u8; 3] = [200, 200, 200];
const PANEL_GRAY: [u8; 3] = [240, 240, 240];
const WHITE: [u8; 3] = [255, 255, 255];

// Item table column anchors.
const COL_NAME_X: f32 = 48.0;
const COL_NAME_WIDTH: f32 = 360.0;
const COL_QTY_X: f32 = 470.0;
const COL_UNIT_X: f32 = 580.0;
const COL_DISCOUNT_X: f32 = 664.0;
const COL_TOTAL_X: f32 = CONTENT_RIGHT;

const ROW_LINE_HEIGHT: f32 = 22.0;
const FOOTER_ZONE: f32 = 90.0;

/// Lay out an invoice into one or two sheets.
///
/// The first sheet is always the invoice itself; a terms page follows
/// when the client accepted the general sale terms.
pub fn compose(invoice: &Invoice) -> Vec<Sheet> {
    let mut sheets = vec![compose_invoice_page(invoice)];
    if invoice.terms_accepted {
        sheets.push(compose_terms_page(invoice));
    }
    sheets
}

// ============================================================================
// INVOICE PAGE
// ============================================================================

fn compose_invoice_page(invoice: &Invoice) -> Sheet {
    let mut sheet = Sheet::a4();
    let company = CompanyInfo::MYCONFORT;

    let mut y = MARGIN;
    y = masthead(&mut sheet, invoice, &company, y);
    y = client_block(&mut sheet, invoice, y + 24.0);
    y = items_table(&mut sheet, invoice, y + 28.0);
    y = totals_block(&mut sheet, invoice, y + 16.0);
    y = notes_and_signature(&mut sheet, invoice, y + 28.0);

    let height = (y + FOOTER_ZONE).max(A4_HEIGHT_PX as f32);
    sheet.height = height.ceil() as u32;
    let footer_top = sheet.height as f32 - 64.0;
    footer(&mut sheet, invoice, &company, footer_top);
    sheet
}

fn masthead(sheet: &mut Sheet, invoice: &Invoice, company: &CompanyInfo, top: f32) -> f32 {
    sheet.text(
        TextRun::new(MARGIN, top, company.name, 32.0)
            .bold()
            .colored(BRAND_GREEN),
    );

    let mut y = top + 40.0;
    for line in [
        company.address_line(),
        format!("{} · {}", company.phone, company.email),
        format!("SIRET {}", company.siret),
        company.website.to_string(),
    ] {
        sheet.text(TextRun::new(MARGIN, y, line, 12.0).colored(MUTED));
        y += 16.0;
    }

    // Right side: document title and identifiers
    sheet.text(
        TextRun::new(CONTENT_RIGHT, top, "FACTURE", 48.0)
            .bold()
            .anchored(TextAnchor::Right)
            .colored(INK),
    );
    let mut right_y = top + 58.0;
    sheet.text(
        TextRun::new(
            CONTENT_RIGHT,
            right_y,
            format!("N° {}", invoice.invoice_number),
            16.0,
        )
        .bold()
        .anchored(TextAnchor::Right),
    );
    right_y += 22.0;
    sheet.text(
        TextRun::new(
            CONTENT_RIGHT,
            right_y,
            format!("Date : {}", format_date(invoice.issue_date)),
            16.0,
        )
        .anchored(TextAnchor::Right),
    );
    right_y += 22.0;
    if let Some(advisor) = &invoice.advisor {
        sheet.text(
            TextRun::new(CONTENT_RIGHT, right_y, format!("Conseiller : {}", advisor), 12.0)
                .anchored(TextAnchor::Right)
                .colored(MUTED),
        );
        right_y += 18.0;
    }

    let bottom = y.max(right_y) + 8.0;
    sheet.rule(Rule {
        x: MARGIN,
        y: bottom,
        width: CONTENT_WIDTH,
        thickness: 2.0,
        color: BRAND_GREEN,
    });
    bottom + 2.0
}

fn client_block(sheet: &mut Sheet, invoice: &Invoice, top: f32) -> f32 {
    let client = &invoice.client;
    let mut lines: Vec<(String, f32, bool)> = vec![(client.name.clone(), 16.0, true)];
    if !client.address.is_empty() {
        lines.push((client.address.clone(), 16.0, false));
    }
    if !client.postal_code.is_empty() || !client.city.is_empty() {
        lines.push((
            format!("{} {}", client.postal_code, client.city).trim().to_string(),
            16.0,
            false,
        ));
    }
    if !client.phone.is_empty() {
        lines.push((client.phone.clone(), 12.0, false));
    }
    if !client.email.is_empty() {
        lines.push((client.email.clone(), 12.0, false));
    }
    if let Some(siret) = &client.siret {
        lines.push((format!("SIRET {}", siret), 12.0, false));
    }

    let pad = 12.0;
    let line_height = 20.0;
    let height = pad * 2.0 + 18.0 + lines.len() as f32 * line_height;
    sheet.frame(Frame {
        x: MARGIN,
        y: top,
        width: 340.0,
        height,
        fill: Some(PANEL_GRAY),
        stroke: None,
        stroke_width: 0.0,
    });
    sheet.text(
        TextRun::new(MARGIN + pad, top + pad, "FACTURÉ À", 12.0)
            .bold()
            .colored(BRAND_GREEN),
    );

    let mut y = top + pad + 18.0;
    for (content, size, bold) in lines {
        let mut run = TextRun::new(MARGIN + pad, y, content, size);
        if bold {
            run = run.bold();
        }
        sheet.text(run);
        y += line_height;
    }

    // Payment terms summary, to the right of the client panel
    let mut pay_y = top + pad;
    sheet.text(
        TextRun::new(420.0, pay_y, "RÈGLEMENT", 12.0)
            .bold()
            .colored(BRAND_GREEN),
    );
    pay_y += 18.0;
    sheet.text(TextRun::new(
        420.0,
        pay_y,
        invoice.payment.method.label(),
        16.0,
    ));
    pay_y += 20.0;
    if invoice.payment.deposit > 0.0 {
        sheet.text(TextRun::new(
            420.0,
            pay_y,
            format!("Acompte versé : {}", format_eur(invoice.payment.deposit)),
            12.0,
        ));
        pay_y += 18.0;
    }
    if let Some(notes) = &invoice.payment.notes {
        for line in wrap_text(notes, 12.0, CONTENT_RIGHT - 420.0) {
            sheet.text(TextRun::new(420.0, pay_y, line, 12.0).colored(MUTED));
            pay_y += 16.0;
        }
    }

    top + height.max(pay_y - top)
}

fn items_table(sheet: &mut Sheet, invoice: &Invoice, top: f32) -> f32 {
    // header bar
    sheet.frame(Frame {
        x: MARGIN,
        y: top,
        width: CONTENT_WIDTH,
        height: 28.0,
        fill: Some(BRAND_GREEN),
        stroke: None,
        stroke_width: 0.0,
    });
    let head_y = top + 7.0;
    sheet.text(
        TextRun::new(COL_NAME_X, head_y, "Désignation", 12.0)
            .bold()
            .colored(WHITE),
    );
    sheet.text(
        TextRun::new(COL_QTY_X, head_y, "Qté", 12.0)
            .bold()
            .anchored(TextAnchor::Center)
            .colored(WHITE),
    );
    sheet.text(
        TextRun::new(COL_UNIT_X, head_y, "PU TTC", 12.0)
            .bold()
            .anchored(TextAnchor::Right)
            .colored(WHITE),
    );
    sheet.text(
        TextRun::new(COL_DISCOUNT_X, head_y, "Remise", 12.0)
            .bold()
            .anchored(TextAnchor::Right)
            .colored(WHITE),
    );
    sheet.text(
        TextRun::new(COL_TOTAL_X, head_y, "Total TTC", 12.0)
            .bold()
            .anchored(TextAnchor::Right)
            .colored(WHITE),
    );

    let mut y = top + 28.0 + 8.0;
    for item in &invoice.items {
        y = item_row(sheet, invoice, item, y);
    }
    if invoice.items.is_empty() {
        sheet.text(
            TextRun::new(COL_NAME_X, y, "(aucun article)", 16.0).colored(MUTED),
        );
        y += ROW_LINE_HEIGHT;
    }

    sheet.rule(Rule {
        x: MARGIN,
        y,
        width: CONTENT_WIDTH,
        thickness: 1.0,
        color: RULE_GRAY,
    });
    y + 4.0
}

fn item_row(sheet: &mut Sheet, invoice: &Invoice, item: &LineItem, top: f32) -> f32 {
    let name_lines = wrap_text(&item.name, 16.0, COL_NAME_WIDTH);
    let mut y = top;
    for line in &name_lines {
        sheet.text(TextRun::new(COL_NAME_X, y, line.clone(), 16.0));
        y += ROW_LINE_HEIGHT;
    }
    sheet.text(
        TextRun::new(COL_NAME_X, y, item.category.label(), 12.0).colored(MUTED),
    );
    y += 18.0;

    sheet.text(
        TextRun::new(COL_QTY_X, top, item.quantity.to_string(), 16.0)
            .anchored(TextAnchor::Center),
    );
    sheet.text(
        TextRun::new(
            COL_UNIT_X,
            top,
            format_eur(item.effective_unit_ttc(invoice.tax_rate)),
            16.0,
        )
        .anchored(TextAnchor::Right),
    );
    let discount = discount_label(&item.discount);
    if !discount.is_empty() {
        sheet.text(
            TextRun::new(COL_DISCOUNT_X, top, discount, 16.0)
                .anchored(TextAnchor::Right),
        );
    }
    sheet.text(
        TextRun::new(
            COL_TOTAL_X,
            top,
            format_eur(item.line_total(invoice.tax_rate)),
            16.0,
        )
        .bold()
        .anchored(TextAnchor::Right),
    );

    sheet.rule(Rule {
        x: MARGIN,
        y: y + 2.0,
        width: CONTENT_WIDTH,
        thickness: 1.0,
        color: RULE_GRAY,
    });
    y + 10.0
}

fn discount_label(discount: &Discount) -> String {
    match discount {
        Discount::None => String::new(),
        Discount::Amount { value } => format!("-{}", format_eur(*value)),
        Discount::Percent { value } => format!("-{}", format_percent(*value)),
    }
}

fn totals_block(sheet: &mut Sheet, invoice: &Invoice, top: f32) -> f32 {
    let label_x = 500.0;
    let mut y = top;

    let row = |sheet: &mut Sheet, y: &mut f32, label: &str, value: String, size: f32, bold: bool, color: [u8; 3]| {
        let mut l = TextRun::new(label_x, *y, label, size).colored(color);
        let mut v = TextRun::new(COL_TOTAL_X, *y, value, size)
            .anchored(TextAnchor::Right)
            .colored(color);
        if bold {
            l = l.bold();
            v = v.bold();
        }
        sheet.text(l);
        sheet.text(v);
        *y += size + 8.0;
    };

    row(sheet, &mut y, "Total HT", format_eur(invoice.total_ht()), 16.0, false, INK);
    row(
        sheet,
        &mut y,
        &format!("TVA ({})", format_percent(invoice.tax_rate * 100.0)),
        format_eur(invoice.tax_amount()),
        16.0,
        false,
        INK,
    );
    row(
        sheet,
        &mut y,
        "TOTAL TTC",
        format_eur(invoice.total()),
        24.0,
        true,
        BRAND_GREEN,
    );
    if invoice.payment.deposit > 0.0 {
        row(
            sheet,
            &mut y,
            "Acompte versé",
            format!("-{}", format_eur(invoice.payment.deposit)),
            16.0,
            false,
            INK,
        );
        row(
            sheet,
            &mut y,
            "RESTE À PAYER",
            format_eur(invoice.balance_due()),
            16.0,
            true,
            INK,
        );
    }
    y
}

fn notes_and_signature(sheet: &mut Sheet, invoice: &Invoice, top: f32) -> f32 {
    let mut y = top;
    let notes_width = if invoice.signature.is_some() {
        420.0
    } else {
        CONTENT_WIDTH
    };

    if !invoice.notes.trim().is_empty() {
        sheet.text(
            TextRun::new(MARGIN, y, "NOTES", 12.0)
                .bold()
                .colored(BRAND_GREEN),
        );
        y += 20.0;
        y = notes_blocks(sheet, &invoice.notes, MARGIN, y, notes_width);
    }

    if let Some(signature) = &invoice.signature {
        let sig_top = top;
        let sig_x = 520.0;
        let sig_w = CONTENT_RIGHT - sig_x;
        sheet.text(
            TextRun::new(sig_x, sig_top, "Signature client", 12.0)
                .bold()
                .colored(BRAND_GREEN),
        );
        sheet.frame(Frame {
            x: sig_x,
            y: sig_top + 20.0,
            width: sig_w,
            height: 90.0,
            fill: None,
            stroke: Some(RULE_GRAY),
            stroke_width: 1.0,
        });
        sheet.image(ImageSlot {
            x: sig_x + 6.0,
            y: sig_top + 26.0,
            width: sig_w - 12.0,
            height: 78.0,
            source: signature.clone(),
        });
        y = y.max(sig_top + 116.0);
    }
    y
}

/// Lay out parsed note blocks, wrapping spans to the given width.
fn notes_blocks(sheet: &mut Sheet, notes: &str, x: f32, top: f32, width: f32) -> f32 {
    let mut y = top;
    for block in parse_notes(notes) {
        match block {
            NoteBlock::Paragraph { spans, size, indent } => {
                // wrap the concatenated text, then re-apply span styles
                // word by word as runs are emitted
                let mut cursor_x = x + indent;
                let line_height = size + 6.0;
                let right_edge = x + width;
                for span in spans {
                    for word in span.text.split_inclusive(' ') {
                        let w = text_width(word.trim_end(), size);
                        if cursor_x + w > right_edge && cursor_x > x + indent {
                            cursor_x = x + indent;
                            y += line_height;
                        }
                        let mut run = TextRun::new(cursor_x, y, word.trim_end(), size);
                        if span.bold {
                            run = run.bold();
                        }
                        if span.underline {
                            run = run.underlined();
                        }
                        sheet.text(run);
                        cursor_x += text_width(word, size);
                    }
                }
                y += line_height;
            }
            NoteBlock::Rule => {
                sheet.rule(Rule {
                    x,
                    y: y + 4.0,
                    width,
                    thickness: 1.0,
                    color: RULE_GRAY,
                });
                y += 14.0;
            }
            NoteBlock::Blank => {
                y += NOTES_BODY_SIZE * 0.6;
            }
        }
    }
    y
}

fn footer(sheet: &mut Sheet, invoice: &Invoice, company: &CompanyInfo, top: f32) {
    let center = sheet.width as f32 / 2.0;
    sheet.rule(Rule {
        x: MARGIN,
        y: top,
        width: sheet.width as f32 - MARGIN * 2.0,
        thickness: 1.0,
        color: RULE_GRAY,
    });
    sheet.text(
        TextRun::new(center, top + 10.0, "Merci de votre confiance !", 16.0)
            .bold()
            .anchored(TextAnchor::Center)
            .colored(BRAND_GREEN),
    );
    let mut legal = format!(
        "{} · SIRET {} · {}",
        company.name, company.siret, company.website
    );
    if invoice.terms_accepted {
        legal.push_str(" · CGV en page 2");
    }
    sheet.text(
        TextRun::new(center, top + 34.0, legal, 12.0)
            .anchored(TextAnchor::Center)
            .colored(MUTED),
    );
}

// ============================================================================
// TERMS PAGE
// ============================================================================

/// General sale terms printed on the second page.
const TERMS_ARTICLES: &[(&str, &str)] = &[
    (
        "Article 1 · Objet",
        "Les présentes conditions régissent les ventes de literie et \
         d'accessoires conclues en magasin ou en foire par MYCONFORT.",
    ),
    (
        "Article 2 · Prix",
        "Les prix s'entendent toutes taxes comprises. Aucun escompte ne \
         sera accordé pour paiement anticipé.",
    ),
    (
        "Article 3 · Livraison",
        "Les délais de livraison sont communiqués à titre indicatif. Un \
         retard ne peut donner lieu ni à annulation, ni à indemnité.",
    ),
    (
        "Article 4 · Rétractation",
        "Conformément au Code de la consommation, les achats conclus en \
         foire ou salon ne bénéficient pas d'un droit de rétractation, \
         sauf souscription d'un crédit affecté.",
    ),
    (
        "Article 5 · Garantie",
        "Les produits bénéficient de la garantie légale de conformité et \
         de la garantie contre les vices cachés.",
    ),
    (
        "Article 6 · Litiges",
        "À défaut d'accord amiable, le litige sera porté devant les \
         tribunaux compétents du siège de MYCONFORT.",
    ),
];

fn compose_terms_page(invoice: &Invoice) -> Sheet {
    let mut sheet = Sheet::a4();
    let center = sheet.width as f32 / 2.0;

    sheet.text(
        TextRun::new(center, MARGIN, "CONDITIONS GÉNÉRALES DE VENTE", 24.0)
            .bold()
            .anchored(TextAnchor::Center)
            .colored(BRAND_GREEN),
    );
    sheet.rule(Rule {
        x: MARGIN,
        y: MARGIN + 36.0,
        width: CONTENT_WIDTH,
        thickness: 2.0,
        color: BRAND_GREEN,
    });

    let mut y = MARGIN + 56.0;
    for (title, body) in TERMS_ARTICLES {
        sheet.text(TextRun::new(MARGIN, y, *title, 16.0).bold());
        y += 24.0;
        for line in wrap_text(body, 12.0, CONTENT_WIDTH) {
            sheet.text(TextRun::new(MARGIN, y, line, 12.0));
            y += 16.0;
        }
        y += 12.0;
    }

    y += 12.0;
    sheet.text(TextRun::new(
        MARGIN,
        y,
        format!(
            "Bon pour accord le {} · {}",
            format_date(invoice.issue_date),
            invoice.client.name
        ),
        16.0,
    ));
    sheet
}
