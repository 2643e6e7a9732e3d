// Builders for synthetic font data.
//
// Offsets written by these builders are 16-bit, so the tables they produce must stay small.

fn push_u16(data: &mut Vec<u8>, value: u16) {
    data.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(data: &mut Vec<u8>, value: u32) {
    data.extend_from_slice(&value.to_be_bytes());
}

fn offset16(offset: usize) -> u16 {
    u16::try_from(offset).expect("offset does not fit in 16 bits")
}

/// Concatenate `bodies` after a header of `header_len` bytes, returning the offset of each body
/// from the start of the header along with the joined bodies.
fn layout_bodies(header_len: usize, bodies: &[Vec<u8>]) -> (Vec<u16>, Vec<u8>) {
    let mut offsets = Vec::with_capacity(bodies.len());
    let mut joined = Vec::new();
    for body in bodies {
        offsets.push(offset16(header_len + joined.len()));
        joined.extend_from_slice(body);
    }
    (offsets, joined)
}

/// A tagged list: count, (tag, offset) records, then the record bodies.
fn tagged_list(records: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let bodies = records.iter().map(|(_, body)| body.clone()).collect::<Vec<_>>();
    let (offsets, joined) = layout_bodies(2 + 6 * records.len(), &bodies);
    let mut data = Vec::new();
    push_u16(&mut data, offset16(records.len()));
    for ((tag, _), offset) in records.iter().zip(offsets) {
        push_u32(&mut data, *tag);
        push_u16(&mut data, offset);
    }
    data.extend(joined);
    data
}

/// Builds a `GSUB` or `GPOS` table.
///
/// Every script gets a default language system and nothing else.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct LayoutTableBuilder {
    scripts: Vec<(u32, Vec<u16>)>,
    features: Vec<(u32, Vec<u16>)>,
    lookups: Vec<(u16, Vec<Vec<u8>>)>,
}

#[allow(dead_code)]
impl LayoutTableBuilder {
    pub fn new() -> Self {
        LayoutTableBuilder::default()
    }

    /// Add a script whose default language system lists `feature_indices`.
    pub fn script(mut self, tag: u32, feature_indices: &[u16]) -> Self {
        self.scripts.push((tag, feature_indices.to_vec()));
        self
    }

    pub fn feature(mut self, tag: u32, lookup_indices: &[u16]) -> Self {
        self.features.push((tag, lookup_indices.to_vec()));
        self
    }

    pub fn lookup(mut self, lookup_type: u16, subtables: Vec<Vec<u8>>) -> Self {
        self.lookups.push((lookup_type, subtables));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let scripts = self
            .scripts
            .iter()
            .map(|(tag, feature_indices)| {
                let mut body = Vec::new();
                push_u16(&mut body, 4); // default langsys
                push_u16(&mut body, 0);
                push_u16(&mut body, 0);
                push_u16(&mut body, 0xFFFF);
                push_u16(&mut body, offset16(feature_indices.len()));
                feature_indices.iter().for_each(|&i| push_u16(&mut body, i));
                (*tag, body)
            })
            .collect::<Vec<_>>();
        let features = self
            .features
            .iter()
            .map(|(tag, lookup_indices)| {
                let mut body = Vec::new();
                push_u16(&mut body, 0);
                push_u16(&mut body, offset16(lookup_indices.len()));
                lookup_indices.iter().for_each(|&i| push_u16(&mut body, i));
                (*tag, body)
            })
            .collect::<Vec<_>>();
        let lookups = self
            .lookups
            .iter()
            .map(|(lookup_type, subtables)| {
                let (offsets, joined) = layout_bodies(6 + 2 * subtables.len(), subtables);
                let mut body = Vec::new();
                push_u16(&mut body, *lookup_type);
                push_u16(&mut body, 0);
                push_u16(&mut body, offset16(subtables.len()));
                offsets.into_iter().for_each(|o| push_u16(&mut body, o));
                body.extend(joined);
                body
            })
            .collect::<Vec<_>>();

        let script_list = tagged_list(&scripts);
        let feature_list = tagged_list(&features);
        let (lookup_offsets, lookup_bodies) = layout_bodies(2 + 2 * lookups.len(), &lookups);
        let mut lookup_list = Vec::new();
        push_u16(&mut lookup_list, offset16(lookups.len()));
        lookup_offsets
            .into_iter()
            .for_each(|o| push_u16(&mut lookup_list, o));
        lookup_list.extend(lookup_bodies);

        let mut data = Vec::new();
        push_u16(&mut data, 1);
        push_u16(&mut data, 0);
        push_u16(&mut data, 10);
        push_u16(&mut data, offset16(10 + script_list.len()));
        push_u16(&mut data, offset16(10 + script_list.len() + feature_list.len()));
        data.extend(script_list);
        data.extend(feature_list);
        data.extend(lookup_list);
        data
    }
}

#[allow(dead_code)]
pub fn coverage_format1(glyphs: &[u16]) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, 1);
    push_u16(&mut data, offset16(glyphs.len()));
    glyphs.iter().for_each(|&g| push_u16(&mut data, g));
    data
}

/// Single substitution format 2 mapping each `(glyph, substitute)` pair.
#[allow(dead_code)]
pub fn single_subst(pairs: &[(u16, u16)]) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, 2);
    push_u16(&mut data, offset16(6 + 2 * pairs.len()));
    push_u16(&mut data, offset16(pairs.len()));
    pairs.iter().for_each(|&(_, s)| push_u16(&mut data, s));
    let glyphs = pairs.iter().map(|&(g, _)| g).collect::<Vec<_>>();
    data.extend(coverage_format1(&glyphs));
    data
}

/// Ligature substitution format 1. Ligatures sharing a first glyph are grouped into one set, in
/// order of first appearance.
#[allow(dead_code)]
pub fn ligature_subst(ligatures: &[(&[u16], u16)]) -> Vec<u8> {
    let mut first_glyphs: Vec<u16> = Vec::new();
    for (components, _) in ligatures {
        if !first_glyphs.contains(&components[0]) {
            first_glyphs.push(components[0]);
        }
    }

    let sets = first_glyphs
        .iter()
        .map(|&first| {
            let bodies = ligatures
                .iter()
                .filter(|(components, _)| components[0] == first)
                .map(|(components, ligature)| {
                    let mut body = Vec::new();
                    push_u16(&mut body, *ligature);
                    push_u16(&mut body, offset16(components.len()));
                    components[1..].iter().for_each(|&g| push_u16(&mut body, g));
                    body
                })
                .collect::<Vec<_>>();
            let (offsets, joined) = layout_bodies(2 + 2 * bodies.len(), &bodies);
            let mut set = Vec::new();
            push_u16(&mut set, offset16(bodies.len()));
            offsets.into_iter().for_each(|o| push_u16(&mut set, o));
            set.extend(joined);
            set
        })
        .collect::<Vec<_>>();

    let header_len = 6 + 2 * sets.len();
    let (set_offsets, joined) = layout_bodies(header_len, &sets);
    let mut data = Vec::new();
    push_u16(&mut data, 1);
    push_u16(&mut data, offset16(header_len + joined.len()));
    push_u16(&mut data, offset16(sets.len()));
    set_offsets.into_iter().for_each(|o| push_u16(&mut data, o));
    data.extend(joined);
    data.extend(coverage_format1(&first_glyphs));
    data
}

/// Single positioning format 1 applying one value record to every glyph.
#[allow(dead_code)]
pub fn single_pos(glyphs: &[u16], value_format: u16, values: &[i16]) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, 1);
    push_u16(&mut data, offset16(6 + 2 * values.len()));
    push_u16(&mut data, value_format);
    values
        .iter()
        .for_each(|&v| data.extend_from_slice(&v.to_be_bytes()));
    data.extend(coverage_format1(glyphs));
    data
}

/// Pair positioning format 1 adjusting the advance of `first` before each second glyph.
#[allow(dead_code)]
pub fn pair_pos(first: u16, pairs: &[(u16, i16)]) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, 1);
    push_u16(&mut data, offset16(12 + 2 + 4 * pairs.len()));
    push_u16(&mut data, 0x0004); // x advance
    push_u16(&mut data, 0x0000);
    push_u16(&mut data, 1);
    push_u16(&mut data, 12);
    push_u16(&mut data, offset16(pairs.len()));
    for &(second, x_advance) in pairs {
        push_u16(&mut data, second);
        data.extend_from_slice(&x_advance.to_be_bytes());
    }
    data.extend(coverage_format1(&[first]));
    data
}

/// A `mort` table with one chain holding a single vertical non-contextual subtable using lookup
/// format 6.
#[allow(dead_code)]
pub fn mort_vertical(pairs: &[(u16, u16)]) -> Vec<u8> {
    let subtable_length = 8 + 2 + 10 + 4 * pairs.len();
    let mut data = Vec::new();
    push_u16(&mut data, 1);
    push_u16(&mut data, 0);
    push_u32(&mut data, 1);
    // chain
    push_u32(&mut data, 1);
    push_u32(&mut data, u32::try_from(12 + subtable_length).unwrap());
    push_u16(&mut data, 0);
    push_u16(&mut data, 1);
    // subtable
    push_u16(&mut data, offset16(subtable_length));
    push_u16(&mut data, 0x8004);
    push_u32(&mut data, 1);
    push_u16(&mut data, 6);
    push_u16(&mut data, 4);
    push_u16(&mut data, offset16(pairs.len()));
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);
    for &(glyph, substitute) in pairs {
        push_u16(&mut data, glyph);
        push_u16(&mut data, substitute);
    }
    data
}

#[allow(dead_code)]
pub fn head_table(units_per_em: u16) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, 1);
    push_u16(&mut data, 0);
    push_u32(&mut data, 0x00010000); // font revision
    push_u32(&mut data, 0); // checksum adjustment
    push_u32(&mut data, 0x5F0F3CF5);
    push_u16(&mut data, 0);
    push_u16(&mut data, units_per_em);
    data.extend_from_slice(&[0; 16]); // created, modified
    data.extend_from_slice(&[0; 8]); // bounding box
    push_u16(&mut data, 0);
    push_u16(&mut data, 8);
    push_u16(&mut data, 2);
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);
    data
}

/// An `OS/2` table of the given version, 78 bytes for version 0 and 86 bytes from version 1.
#[allow(dead_code)]
pub fn os2_table(version: u16) -> Vec<u8> {
    let mut data = Vec::new();
    push_u16(&mut data, version);
    push_u16(&mut data, 500); // average char width
    push_u16(&mut data, 400); // weight class
    push_u16(&mut data, 5); // width class
    push_u16(&mut data, 0); // fs type
    data.extend_from_slice(&[0; 20]); // sub/superscript and strikeout metrics
    push_u16(&mut data, 0); // family class
    data.extend_from_slice(&[2, 11, 6, 9, 0, 0, 0, 0, 0, 0]); // panose
    data.extend_from_slice(&[0; 16]); // unicode ranges
    data.extend_from_slice(b"TEST");
    push_u16(&mut data, 0x0040); // fs selection
    push_u16(&mut data, 0x20);
    push_u16(&mut data, 0xFFFF);
    push_u16(&mut data, 880); // typo ascender
    push_u16(&mut data, (-120i16) as u16); // typo descender
    push_u16(&mut data, 0);
    push_u16(&mut data, 880); // win ascent
    push_u16(&mut data, 120); // win descent
    if version >= 1 {
        push_u32(&mut data, 0x0002_0000);
        push_u32(&mut data, 0);
    }
    data
}

/// An sfnt whose table offsets are relative to `base`, the position the font will occupy in the
/// final file.
fn sfnt_at(base: usize, tables: &[(u32, Vec<u8>)]) -> Vec<u8> {
    let directory_len = 12 + 16 * tables.len();
    let mut data = Vec::new();
    push_u32(&mut data, 0x00010000);
    push_u16(&mut data, offset16(tables.len()));
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);

    let mut offset = directory_len;
    for (tag, table) in tables {
        push_u32(&mut data, *tag);
        push_u32(&mut data, 0);
        push_u32(&mut data, u32::try_from(base + offset).unwrap());
        push_u32(&mut data, u32::try_from(table.len()).unwrap());
        offset += (table.len() + 3) & !3;
    }
    for (_, table) in tables {
        data.extend_from_slice(table);
        data.resize((data.len() + 3) & !3, 0);
    }
    data
}

#[allow(dead_code)]
pub fn font_data(tables: &[(u32, Vec<u8>)]) -> Vec<u8> {
    sfnt_at(0, tables)
}

/// A TrueType collection holding one font per entry of `fonts`.
#[allow(dead_code)]
pub fn collection_data(fonts: &[Vec<(u32, Vec<u8>)>]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"ttcf");
    push_u16(&mut data, 1);
    push_u16(&mut data, 0);
    push_u32(&mut data, u32::try_from(fonts.len()).unwrap());

    let mut base = 12 + 4 * fonts.len();
    let mut bodies = Vec::with_capacity(fonts.len());
    for tables in fonts {
        push_u32(&mut data, u32::try_from(base).unwrap());
        let body = sfnt_at(base, tables);
        base += body.len();
        bodies.push(body);
    }
    bodies.into_iter().for_each(|body| data.extend(body));
    data
}
