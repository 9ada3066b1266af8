use std::io::Write;

use crate::error::Result;
use crate::segments::SegmentSet;

/// Writes the segment mesh as a `lines2d` document.
///
/// Every segment contributes its two endpoints to `<vertices>`; each region
/// becomes one entry of `<groups>` holding the half-open vertex range
/// `begin..end` of its segments.
///
/// # Errors
///
/// Returns `PathsError::Io` if writing fails.
pub fn write_lines2d(set: &SegmentSet, out: &mut impl Write) -> Result<()> {
    writeln!(out, "<lines2d>")?;
    writeln!(out, "<vertices>")?;
    let mut ranges = Vec::with_capacity(set.num_regions());
    let mut vertex = 0usize;
    for group in set.groups() {
        writeln!(out, "\t<!-- region {} -->", group.region)?;
        let begin = vertex;
        for seg in &set.segments()[group.range.clone()] {
            for p in [seg.start, seg.end] {
                writeln!(
                    out,
                    "\t<vertex id=\"{vertex}\" x=\"{}\" y=\"{}\"/>",
                    p.x, p.y
                )?;
                vertex += 1;
            }
        }
        ranges.push((begin, vertex));
    }
    writeln!(out, "</vertices>")?;

    writeln!(out, "<groups>")?;
    for (region, (begin, end)) in ranges.into_iter().enumerate() {
        let inverted = set.is_region_inverted(region);
        writeln!(out, "\t<group id=\"{region}\" inverted=\"{inverted}\">")?;
        writeln!(out, "\t\t<begin>{begin}</begin>")?;
        writeln!(out, "\t\t<end>{end}</end>")?;
        writeln!(out, "\t</group>")?;
    }
    writeln!(out, "</groups>")?;
    writeln!(out, "</lines2d>")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::segments::FillRule;

    #[test]
    fn document_lists_vertices_and_groups() {
        let mut set = SegmentSet::default();
        let tri = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 0.5),
        ];
        set.push_region(vec![tri.clone()], FillRule::EvenOdd, false);
        set.push_region(vec![tri], FillRule::EvenOdd, true);

        let mut buf = Vec::new();
        write_lines2d(&set, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let doc = roxmltree::Document::parse(&text).unwrap();

        let vertices: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("vertex"))
            .collect();
        assert_eq!(vertices.len(), 12);
        assert_eq!(vertices[3].attribute("y"), Some("0.5"));

        let groups: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("group"))
            .collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].attribute("inverted"), Some("true"));
        let begin = groups[1]
            .children()
            .find(|n| n.has_tag_name("begin"))
            .and_then(|n| n.text());
        assert_eq!(begin, Some("6"));
    }
}
