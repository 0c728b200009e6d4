//! Mapping between [`Layout`] and the XML element tree.
//!
//! Scalars live in attributes, vectors and colors in small child elements, and a node's
//! children in a nested `<Children>` element. Text strings go through [`escape_text`] so
//! that line breaks survive attribute value normalization.

use super::xml::Element;
use crate::layout::LayoutInfo;
use crate::material::{
    AlphaCompare, BlendMode, ChanControl, IndirectOrder, IndirectStage, Material, SwapMode,
    TevCombiner, TevStage, TevSwapTable, TexCoordGen, TextureRef, TextureSrt,
};
use crate::panes::{
    escape_text, unescape_text, ContentOverflow, Group, Pane, PaneProperties, Picture, Text,
    Window, WindowFrame,
};
use crate::tree::{Node, MAX_TREE_DEPTH};
use crate::types::{
    Color16, Color8, HorizontalOrigin, Origin, PaneFlags, TexCoord, UvSet, Vec2, Vec3,
    VerticalOrigin, VertexColors,
};
use crate::{Error, FileHeader, Layout, Result};

pub(crate) fn layout_to_element(layout: &Layout) -> Element {
    let mut root = Element::new("Layout")
        .attr("version", layout.version)
        .attr("centered", layout.info.centered)
        .attr("width", layout.info.width)
        .attr("height", layout.info.height)
        .children(
            layout
                .textures
                .as_deref()
                .map(|names| name_list("Textures", "Texture", names)),
        )
        .children(
            layout
                .fonts
                .as_deref()
                .map(|names| name_list("Fonts", "Font", names)),
        )
        .child(Element::new("Materials").children(layout.materials.iter().map(material_element)));

    root = root.child(with_children(
        pane_element("Pane", &layout.root_pane.properties),
        &layout.root_pane.children,
    ));
    if let Some(group) = &layout.root_group {
        root = root.child(with_children(group_element(group), &group.children));
    }
    root
}

pub(crate) fn layout_from_element(root: &Element) -> Result<Layout> {
    if root.tag != "Layout" {
        return Err(Error::Interchange(format!(
            "expected <Layout> root element, found <{}>",
            root.tag
        )));
    }

    let defaults = LayoutInfo::default();
    let info = LayoutInfo {
        centered: root.parse_or("centered", defaults.centered)?,
        width: root.parse_or("width", defaults.width)?,
        height: root.parse_or("height", defaults.height)?,
    };

    let root_pane = match read_node(root.find("Pane").ok_or(Error::MissingRootPane)?, 0)? {
        Node::Pane(pane) => pane,
        _ => return Err(Error::MissingRootPane),
    };
    let root_group = match root.find("Group").map(|group| read_node(group, 0)).transpose()? {
        Some(Node::Group(group)) => Some(group),
        _ => None,
    };

    let materials = match root.find("Materials") {
        Some(element) => element
            .find_all("Material")
            .map(read_material)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(Layout {
        version: root.parse_or("version", FileHeader::DEFAULT_VERSION)?,
        info,
        textures: root
            .find("Textures")
            .map(|list| read_names(list, "Texture"))
            .transpose()?,
        fonts: root
            .find("Fonts")
            .map(|list| read_names(list, "Font"))
            .transpose()?,
        materials,
        root_pane,
        root_group,
    })
}

fn name_list(tag: &str, item: &str, names: &[String]) -> Element {
    Element::new(tag).children(names.iter().map(|name| Element::new(item).attr("name", name)))
}

fn read_names(list: &Element, item: &str) -> Result<Vec<String>> {
    list.find_all(item).map(|entry| entry.parse("name")).collect()
}

// Value types

fn color8(tag: &str, color: Color8) -> Element {
    Element::new(tag)
        .attr("r", color.r)
        .attr("g", color.g)
        .attr("b", color.b)
        .attr("a", color.a)
}

fn read_color8(element: &Element) -> Result<Color8> {
    Ok(Color8::new(
        element.parse("r")?,
        element.parse("g")?,
        element.parse("b")?,
        element.parse("a")?,
    ))
}

fn color16(tag: &str, color: Color16) -> Element {
    Element::new(tag)
        .attr("r", color.r)
        .attr("g", color.g)
        .attr("b", color.b)
        .attr("a", color.a)
}

fn read_color16(element: &Element) -> Result<Color16> {
    Ok(Color16::new(
        element.parse("r")?,
        element.parse("g")?,
        element.parse("b")?,
        element.parse("a")?,
    ))
}

fn vec2(tag: &str, v: Vec2) -> Element {
    Element::new(tag).attr("x", v.x).attr("y", v.y)
}

fn read_vec2(element: &Element) -> Result<Vec2> {
    Ok(Vec2::new(element.parse("x")?, element.parse("y")?))
}

fn vec3(tag: &str, v: Vec3) -> Element {
    Element::new(tag).attr("x", v.x).attr("y", v.y).attr("z", v.z)
}

fn read_vec3(element: &Element) -> Result<Vec3> {
    Ok(Vec3::new(
        element.parse("x")?,
        element.parse("y")?,
        element.parse("z")?,
    ))
}

const CORNERS: [&str; 4] = ["TopLeft", "TopRight", "BottomLeft", "BottomRight"];

fn vertex_colors(colors: &VertexColors) -> Element {
    let corners = [
        colors.top_left,
        colors.top_right,
        colors.bottom_left,
        colors.bottom_right,
    ];
    Element::new("VertexColors").children(
        CORNERS
            .iter()
            .zip(corners)
            .map(|(tag, color)| color8(tag, color)),
    )
}

fn read_vertex_colors(element: Option<&Element>) -> Result<VertexColors> {
    let Some(element) = element else {
        return Ok(VertexColors::default());
    };
    Ok(VertexColors {
        top_left: read_color8(element.require("TopLeft")?)?,
        top_right: read_color8(element.require("TopRight")?)?,
        bottom_left: read_color8(element.require("BottomLeft")?)?,
        bottom_right: read_color8(element.require("BottomRight")?)?,
    })
}

fn uv_sets(sets: &[UvSet]) -> Element {
    Element::new("UvSets").children(sets.iter().map(|uv| {
        let corners = [uv.top_left, uv.top_right, uv.bottom_left, uv.bottom_right];
        Element::new("UvSet").children(
            CORNERS
                .iter()
                .zip(corners)
                .map(|(tag, coord)| Element::new(*tag).attr("s", coord.s).attr("t", coord.t)),
        )
    }))
}

fn read_uv_sets(element: Option<&Element>) -> Result<Vec<UvSet>> {
    let Some(element) = element else {
        return Ok(Vec::new());
    };
    let coord = |set: &Element, tag: &str| -> Result<TexCoord> {
        let corner = set.require(tag)?;
        Ok(TexCoord {
            s: corner.parse("s")?,
            t: corner.parse("t")?,
        })
    };
    element
        .find_all("UvSet")
        .map(|set| {
            Ok(UvSet {
                top_left: coord(set, "TopLeft")?,
                top_right: coord(set, "TopRight")?,
                bottom_left: coord(set, "BottomLeft")?,
                bottom_right: coord(set, "BottomRight")?,
            })
        })
        .collect()
}

// Panes

fn horizontal_name(origin: HorizontalOrigin) -> &'static str {
    match origin {
        HorizontalOrigin::Left => "left",
        HorizontalOrigin::Center => "center",
        HorizontalOrigin::Right => "right",
    }
}

fn vertical_name(origin: VerticalOrigin) -> &'static str {
    match origin {
        VerticalOrigin::Top => "top",
        VerticalOrigin::Center => "center",
        VerticalOrigin::Bottom => "bottom",
    }
}

fn read_origin(element: &Element) -> Result<Origin> {
    let horizontal = match element.get("origin_x").unwrap_or("center") {
        "left" => HorizontalOrigin::Left,
        "center" => HorizontalOrigin::Center,
        "right" => HorizontalOrigin::Right,
        other => {
            return Err(Error::Interchange(format!(
                "invalid horizontal origin '{other}'"
            )))
        }
    };
    let vertical = match element.get("origin_y").unwrap_or("center") {
        "top" => VerticalOrigin::Top,
        "center" => VerticalOrigin::Center,
        "bottom" => VerticalOrigin::Bottom,
        other => {
            return Err(Error::Interchange(format!(
                "invalid vertical origin '{other}'"
            )))
        }
    };
    Ok(Origin {
        horizontal,
        vertical,
    })
}

fn pane_element(tag: &str, properties: &PaneProperties) -> Element {
    Element::new(tag)
        .attr("name", &properties.name)
        .attr("user_data", &properties.user_data)
        .attr("visible", properties.flags.visible)
        .attr("widescreen", properties.flags.widescreen)
        .attr("flags_extra", properties.flags.extra)
        .attr("origin_x", horizontal_name(properties.origin.horizontal))
        .attr("origin_y", vertical_name(properties.origin.vertical))
        .attr("alpha", properties.alpha)
        .child(vec3("Translate", properties.translate))
        .child(vec3("Rotate", properties.rotate))
        .child(vec2("Scale", properties.scale))
        .child(
            Element::new("Size")
                .attr("width", properties.width)
                .attr("height", properties.height),
        )
}

fn read_properties(element: &Element) -> Result<PaneProperties> {
    let mut properties = PaneProperties::new(element.parse::<String>("name")?);
    properties.user_data = element.parse_or("user_data", String::new())?;

    let extra: u8 = element.parse_or("flags_extra", 0)?;
    if extra > 0x3F {
        return Err(Error::Interchange(format!(
            "pane '{}' has flags_extra {extra}, which does not fit in 6 bits",
            properties.name
        )));
    }
    properties.flags = PaneFlags {
        visible: element.parse_or("visible", true)?,
        widescreen: element.parse_or("widescreen", false)?,
        extra,
    };
    properties.origin = read_origin(element)?;
    properties.alpha = element.parse_or("alpha", properties.alpha)?;

    if let Some(translate) = element.find("Translate") {
        properties.translate = read_vec3(translate)?;
    }
    if let Some(rotate) = element.find("Rotate") {
        properties.rotate = read_vec3(rotate)?;
    }
    if let Some(scale) = element.find("Scale") {
        properties.scale = read_vec2(scale)?;
    }
    if let Some(size) = element.find("Size") {
        properties.width = size.parse("width")?;
        properties.height = size.parse("height")?;
    }
    Ok(properties)
}

fn group_element(group: &Group) -> Element {
    Element::new("Group").attr("name", &group.name).children(
        group
            .panes
            .iter()
            .map(|name| Element::new("Member").attr("name", name)),
    )
}

fn with_children(element: Element, children: &[Node]) -> Element {
    if children.is_empty() {
        return element;
    }
    element.child(Element::new("Children").children(children.iter().map(node_element)))
}

fn node_element(node: &Node) -> Element {
    let element = match node {
        Node::Pane(pane) => pane_element("Pane", &pane.properties),
        Node::Bounding(pane) => pane_element("Bounding", &pane.properties),
        Node::Picture(picture) => pane_element("Picture", &picture.properties)
            .attr("material", picture.material_index)
            .child(vertex_colors(&picture.vertex_colors))
            .child(uv_sets(&picture.uv_sets)),
        Node::Text(text) => pane_element("Text", &text.properties)
            .attr("string_length", text.string_length)
            .attr("max_string_length", text.max_string_length)
            .attr("material", text.material_index)
            .attr("font", text.font_index)
            .attr("text_origin", text.text_origin)
            .attr("line_alignment", text.line_alignment)
            .attr("char_spacing", text.char_spacing)
            .attr("line_spacing", text.line_spacing)
            .attr("text", escape_text(&text.text))
            .child(color8("TopColor", text.top_color))
            .child(color8("BottomColor", text.bottom_color))
            .child(vec2("FontSize", text.font_size)),
        Node::Window(window) => {
            let overflow = &window.content_overflow;
            pane_element("Window", &window.properties)
                .attr("material", window.material_index)
                .child(
                    Element::new("ContentOverflow")
                        .attr("left", overflow.left)
                        .attr("right", overflow.right)
                        .attr("top", overflow.top)
                        .attr("bottom", overflow.bottom),
                )
                .child(vertex_colors(&window.vertex_colors))
                .child(uv_sets(&window.uv_sets))
                .child(Element::new("Frames").children(window.frames.iter().map(|frame| {
                    Element::new("Frame")
                        .attr("material", frame.material_index)
                        .attr("texture_flip", frame.texture_flip)
                })))
        }
        Node::Group(group) => group_element(group),
    };
    with_children(element, node.children())
}

fn read_node(element: &Element, depth: usize) -> Result<Node> {
    let children = match element.find("Children") {
        Some(_) if depth >= MAX_TREE_DEPTH => {
            return Err(Error::TreeTooDeep {
                max: MAX_TREE_DEPTH,
            })
        }
        Some(list) => list
            .children
            .iter()
            .map(|child| read_node(child, depth + 1))
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    let node = match element.tag.as_str() {
        "Pane" => Node::Pane(Pane {
            properties: read_properties(element)?,
            children,
        }),
        "Bounding" => Node::Bounding(Pane {
            properties: read_properties(element)?,
            children,
        }),
        "Picture" => Node::Picture(Picture {
            properties: read_properties(element)?,
            vertex_colors: read_vertex_colors(element.find("VertexColors"))?,
            material_index: element.parse("material")?,
            uv_sets: read_uv_sets(element.find("UvSets"))?,
            children,
        }),
        "Text" => {
            let raw = element.get("text").unwrap_or_default();
            let mut text = Text::new(read_properties(element)?, unescape_text(raw));
            text.string_length = element.parse_or("string_length", 0)?;
            text.max_string_length = element.parse_or("max_string_length", 0)?;
            text.material_index = element.parse("material")?;
            text.font_index = element.parse_or("font", 0)?;
            text.text_origin = element.parse_or("text_origin", 0)?;
            text.line_alignment = element.parse_or("line_alignment", 0)?;
            text.char_spacing = element.parse_or("char_spacing", 0.0)?;
            text.line_spacing = element.parse_or("line_spacing", 0.0)?;
            if let Some(color) = element.find("TopColor") {
                text.top_color = read_color8(color)?;
            }
            if let Some(color) = element.find("BottomColor") {
                text.bottom_color = read_color8(color)?;
            }
            if let Some(size) = element.find("FontSize") {
                text.font_size = read_vec2(size)?;
            }
            text.children = children;
            Node::Text(text)
        }
        "Window" => {
            let content_overflow = match element.find("ContentOverflow") {
                Some(overflow) => ContentOverflow {
                    left: overflow.parse("left")?,
                    right: overflow.parse("right")?,
                    top: overflow.parse("top")?,
                    bottom: overflow.parse("bottom")?,
                },
                None => ContentOverflow::default(),
            };
            let frames = match element.find("Frames") {
                Some(list) => list
                    .find_all("Frame")
                    .map(|frame| {
                        Ok(WindowFrame {
                            material_index: frame.parse("material")?,
                            texture_flip: frame.parse_or("texture_flip", 0)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            Node::Window(Window {
                properties: read_properties(element)?,
                content_overflow,
                vertex_colors: read_vertex_colors(element.find("VertexColors"))?,
                material_index: element.parse("material")?,
                uv_sets: read_uv_sets(element.find("UvSets"))?,
                frames,
                children,
            })
        }
        "Group" => Node::Group(Group {
            name: element.parse("name")?,
            panes: read_names(element, "Member")?,
            children,
        }),
        other => {
            return Err(Error::Interchange(format!(
                "unknown node element <{other}>"
            )))
        }
    };
    Ok(node)
}

// Materials

fn srt(tag: &str, srt: &TextureSrt) -> Element {
    Element::new(tag)
        .attr("rotation", srt.rotation)
        .child(vec2("Translate", srt.translate))
        .child(vec2("Scale", srt.scale))
}

fn read_srt(element: &Element) -> Result<TextureSrt> {
    Ok(TextureSrt {
        translate: read_vec2(element.require("Translate")?)?,
        rotation: element.parse("rotation")?,
        scale: read_vec2(element.require("Scale")?)?,
    })
}

fn combiner(tag: &str, c: &TevCombiner) -> Element {
    Element::new(tag)
        .attr("a", c.a)
        .attr("b", c.b)
        .attr("c", c.c)
        .attr("d", c.d)
        .attr("op", c.op)
        .attr("bias", c.bias)
        .attr("scale", c.scale)
        .attr("clamp", c.clamp)
        .attr("register", c.register)
        .attr("constant_sel", c.constant_sel)
}

fn read_combiner(element: &Element) -> Result<TevCombiner> {
    Ok(TevCombiner {
        a: element.parse("a")?,
        b: element.parse("b")?,
        c: element.parse("c")?,
        d: element.parse("d")?,
        op: element.parse("op")?,
        bias: element.parse("bias")?,
        scale: element.parse("scale")?,
        clamp: element.parse("clamp")?,
        register: element.parse("register")?,
        constant_sel: element.parse("constant_sel")?,
    })
}

fn tev_stage(stage: &TevStage) -> Element {
    let indirect = &stage.indirect;
    Element::new("TevStage")
        .attr("tex_coord", stage.tex_coord)
        .attr("color", stage.color)
        .attr("tex_map", stage.tex_map)
        .attr("ras_sel", stage.ras_sel)
        .attr("tex_sel", stage.tex_sel)
        .child(combiner("ColorCombiner", &stage.color_combiner))
        .child(combiner("AlphaCombiner", &stage.alpha_combiner))
        .child(
            Element::new("Indirect")
                .attr("tex_id", indirect.tex_id)
                .attr("bias", indirect.bias)
                .attr("matrix", indirect.matrix)
                .attr("wrap_s", indirect.wrap_s)
                .attr("wrap_t", indirect.wrap_t)
                .attr("format", indirect.format)
                .attr("add_previous", indirect.add_previous)
                .attr("utc_lod", indirect.utc_lod)
                .attr("alpha", indirect.alpha),
        )
}

fn read_tev_stage(element: &Element) -> Result<TevStage> {
    let indirect = element.require("Indirect")?;
    Ok(TevStage {
        tex_coord: element.parse("tex_coord")?,
        color: element.parse("color")?,
        tex_map: element.parse("tex_map")?,
        ras_sel: element.parse("ras_sel")?,
        tex_sel: element.parse("tex_sel")?,
        color_combiner: read_combiner(element.require("ColorCombiner")?)?,
        alpha_combiner: read_combiner(element.require("AlphaCombiner")?)?,
        indirect: IndirectStage {
            tex_id: indirect.parse("tex_id")?,
            bias: indirect.parse("bias")?,
            matrix: indirect.parse("matrix")?,
            wrap_s: indirect.parse("wrap_s")?,
            wrap_t: indirect.parse("wrap_t")?,
            format: indirect.parse("format")?,
            add_previous: indirect.parse("add_previous")?,
            utc_lod: indirect.parse("utc_lod")?,
            alpha: indirect.parse("alpha")?,
        },
    })
}

fn material_element(material: &Material) -> Element {
    Element::new("Material")
        .attr("name", &material.name)
        .attr("reserved_flags", material.reserved_flags)
        .child(color16("ForeColor", material.fore_color))
        .child(color16("BackColor", material.back_color))
        .child(color16("ColorReg3", material.color_reg3))
        .children(material.tev_colors.iter().map(|c| color8("TevColor", *c)))
        .children(material.textures.iter().map(|texture| {
            Element::new("Texture")
                .attr("name", &texture.name)
                .attr("wrap_s", texture.wrap_s)
                .attr("wrap_t", texture.wrap_t)
        }))
        .children(material.texture_srts.iter().map(|s| srt("TextureSrt", s)))
        .children(material.tex_coord_gens.iter().map(|gen| {
            Element::new("TexCoordGen")
                .attr("type", gen.gen_type)
                .attr("source", gen.source)
                .attr("matrix", gen.matrix)
        }))
        .children(material.chan_control.map(|chan| {
            Element::new("ChanControl")
                .attr("color_source", chan.color_source)
                .attr("alpha_source", chan.alpha_source)
        }))
        .children(material.material_color.map(|c| color8("MaterialColor", c)))
        .children(material.tev_swap.map(|table| {
            Element::new("TevSwap").children(table.modes.iter().map(|mode| {
                Element::new("SwapMode")
                    .attr("r", mode.r)
                    .attr("g", mode.g)
                    .attr("b", mode.b)
                    .attr("a", mode.a)
            }))
        }))
        .children(material.indirect_srts.iter().map(|s| srt("IndirectSrt", s)))
        .children(material.indirect_orders.iter().map(|order| {
            Element::new("IndirectOrder")
                .attr("tex_coord", order.tex_coord)
                .attr("tex_map", order.tex_map)
                .attr("scale_s", order.scale_s)
                .attr("scale_t", order.scale_t)
        }))
        .children(material.tev_stages.iter().map(tev_stage))
        .children(material.alpha_compare.map(|compare| {
            Element::new("AlphaCompare")
                .attr("comp0", compare.comp0)
                .attr("comp1", compare.comp1)
                .attr("op", compare.op)
                .attr("ref0", compare.ref0)
                .attr("ref1", compare.ref1)
        }))
        .children(material.blend_mode.map(|blend| {
            Element::new("BlendMode")
                .attr("type", blend.blend_type)
                .attr("source", blend.source)
                .attr("destination", blend.destination)
                .attr("logic_op", blend.logic_op)
        }))
}

fn read_material(element: &Element) -> Result<Material> {
    let mut material = Material::new(element.parse::<String>("name")?);
    material.reserved_flags = element.parse_or("reserved_flags", 0)?;

    if let Some(color) = element.find("ForeColor") {
        material.fore_color = read_color16(color)?;
    }
    if let Some(color) = element.find("BackColor") {
        material.back_color = read_color16(color)?;
    }
    if let Some(color) = element.find("ColorReg3") {
        material.color_reg3 = read_color16(color)?;
    }
    for (slot, color) in material
        .tev_colors
        .iter_mut()
        .zip(element.find_all("TevColor"))
    {
        *slot = read_color8(color)?;
    }

    material.textures = element
        .find_all("Texture")
        .map(|texture| {
            Ok(TextureRef {
                name: texture.parse("name")?,
                wrap_s: texture.parse_or("wrap_s", 0)?,
                wrap_t: texture.parse_or("wrap_t", 0)?,
            })
        })
        .collect::<Result<_>>()?;
    material.texture_srts = element
        .find_all("TextureSrt")
        .map(read_srt)
        .collect::<Result<_>>()?;
    material.tex_coord_gens = element
        .find_all("TexCoordGen")
        .map(|gen| {
            Ok(TexCoordGen {
                gen_type: gen.parse("type")?,
                source: gen.parse("source")?,
                matrix: gen.parse("matrix")?,
            })
        })
        .collect::<Result<_>>()?;
    material.chan_control = element
        .find("ChanControl")
        .map(|chan| {
            Ok::<_, Error>(ChanControl {
                color_source: chan.parse("color_source")?,
                alpha_source: chan.parse("alpha_source")?,
            })
        })
        .transpose()?;
    material.material_color = element
        .find("MaterialColor")
        .map(read_color8)
        .transpose()?;
    material.tev_swap = element
        .find("TevSwap")
        .map(|table| {
            let mut swap = TevSwapTable::default();
            for (slot, mode) in swap.modes.iter_mut().zip(table.find_all("SwapMode")) {
                *slot = SwapMode {
                    r: mode.parse("r")?,
                    g: mode.parse("g")?,
                    b: mode.parse("b")?,
                    a: mode.parse("a")?,
                };
            }
            Ok::<_, Error>(swap)
        })
        .transpose()?;
    material.indirect_srts = element
        .find_all("IndirectSrt")
        .map(read_srt)
        .collect::<Result<_>>()?;
    material.indirect_orders = element
        .find_all("IndirectOrder")
        .map(|order| {
            Ok(IndirectOrder {
                tex_coord: order.parse("tex_coord")?,
                tex_map: order.parse("tex_map")?,
                scale_s: order.parse("scale_s")?,
                scale_t: order.parse("scale_t")?,
            })
        })
        .collect::<Result<_>>()?;
    material.tev_stages = element
        .find_all("TevStage")
        .map(read_tev_stage)
        .collect::<Result<_>>()?;
    material.alpha_compare = element
        .find("AlphaCompare")
        .map(|compare| {
            Ok::<_, Error>(AlphaCompare {
                comp0: compare.parse("comp0")?,
                comp1: compare.parse("comp1")?,
                op: compare.parse("op")?,
                ref0: compare.parse("ref0")?,
                ref1: compare.parse("ref1")?,
            })
        })
        .transpose()?;
    material.blend_mode = element
        .find("BlendMode")
        .map(|blend| {
            Ok::<_, Error>(BlendMode {
                blend_type: blend.parse("type")?,
                source: blend.parse("source")?,
                destination: blend.parse("destination")?,
                logic_op: blend.parse("logic_op")?,
            })
        })
        .transpose()?;
    Ok(material)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text() -> Text {
        let mut text = Text::new(PaneProperties::new("T_title"), "Line 1\nLine\t2 \\ end");
        text.string_length = 40;
        text.max_string_length = 64;
        text.font_size = Vec2::new(24.0, 26.5);
        text
    }

    #[test]
    fn test_text_is_escaped_in_attribute() {
        let element = node_element(&Node::Text(sample_text()));
        assert_eq!(element.get("text"), Some("Line 1\\nLine\\t2 \\\\ end"));
        let decoded = read_node(&element, 0).unwrap();
        assert_eq!(decoded, Node::Text(sample_text()));
    }

    #[test]
    fn test_nested_children() {
        let mut parent = Pane::new(PaneProperties::new("N_parent"));
        parent
            .children
            .push(Node::Bounding(Pane::new(PaneProperties::new("B_child"))));
        let element = node_element(&Node::Pane(parent.clone()));
        let list = element.require("Children").unwrap();
        assert_eq!(list.children[0].tag, "Bounding");
        assert_eq!(read_node(&element, 0).unwrap(), Node::Pane(parent));
    }

    #[test]
    fn test_children_past_depth_limit() {
        let mut element = Element::new("Pane").attr("name", "N_leaf");
        for _ in 0..=MAX_TREE_DEPTH {
            element = Element::new("Pane")
                .attr("name", "N_link")
                .child(Element::new("Children").child(element));
        }
        assert!(matches!(
            read_node(&element, 0),
            Err(Error::TreeTooDeep { max: MAX_TREE_DEPTH })
        ));
    }

    #[test]
    fn test_missing_root_pane() {
        let root = Element::new("Layout").child(Element::new("Materials"));
        assert!(matches!(
            layout_from_element(&root),
            Err(Error::MissingRootPane)
        ));
    }

    #[test]
    fn test_wrong_root_element() {
        assert!(matches!(
            layout_from_element(&Element::new("Scene")),
            Err(Error::Interchange(_))
        ));
    }

    #[test]
    fn test_unknown_node_element() {
        let element = Element::new("Sprite").attr("name", "x");
        assert!(matches!(read_node(&element, 0), Err(Error::Interchange(_))));
    }

    #[test]
    fn test_bad_origin() {
        let element = Element::new("Pane").attr("name", "P").attr("origin_x", "middle");
        assert!(matches!(read_node(&element, 0), Err(Error::Interchange(_))));
    }

    #[test]
    fn test_material_presence_survives() {
        let mut material = Material::new("M_test");
        material.reserved_flags = 0x0000_0005;
        material.material_color = Some(Color8::new(9, 8, 7, 6));
        material.tev_stages = vec![TevStage::default(); 2];
        material.blend_mode = Some(BlendMode::default());
        let element = material_element(&material);
        assert!(element.find("ChanControl").is_none());
        assert_eq!(element.find_all("TevStage").count(), 2);
        assert_eq!(read_material(&element).unwrap(), material);
    }
}
