// ObjPack - Self-contained OBJ asset packer
// Copyright (C) 2025 ObjPack Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

#![allow(clippy::unwrap_used)]
//! Property-based tests for geometry merging and texture references
//!
//! - Face indices shift by the counts of all earlier files
//! - Merged totals equal the sum of per-file totals
//! - Merged output never contains dangling references
//! - Leading texture option flags are always stripped

use objpack_media::geometry::{GeometryDocument, GeometryMerger, GeometrySource};
use objpack_media::extract_texture_path;
use proptest::prelude::*;

/// One generated file: (positions, texcoords, normals, faces as local position indices)
fn arb_part() -> impl Strategy<Value = (usize, usize, usize, Vec<usize>)> {
    (1usize..20, 1usize..10, 1usize..10).prop_flat_map(|(v, t, n)| {
        let faces = prop::collection::vec(1..=v, 0..12);
        (Just(v), Just(t), Just(n), faces)
    })
}

fn render_part(v: usize, t: usize, n: usize, faces: &[usize]) -> String {
    let mut out = String::new();
    for i in 0..v {
        out.push_str(&format!("v {} 0 0\n", i));
    }
    for _ in 0..t {
        out.push_str("vt 0 0\n");
    }
    for _ in 0..n {
        out.push_str("vn 0 0 1\n");
    }
    for &p in faces {
        out.push_str(&format!("f {}/{}/{} {}//{}\n", p, t, n, p, 1));
    }
    out
}

#[test]
fn proptest_face_indices_follow_offset_law() {
    proptest!(|(parts in prop::collection::vec(arb_part(), 1..5))| {
        let sources: Vec<GeometrySource> = parts
            .iter()
            .enumerate()
            .map(|(i, (v, t, n, faces))| {
                GeometrySource::new(format!("part{}.obj", i), render_part(*v, *t, *n, faces))
            })
            .collect();

        let merged = GeometryMerger::new().merge(&sources).unwrap();
        let doc = GeometryDocument::parse(&merged.content);

        let mut expected = Vec::new();
        let (mut pv, mut pt, mut pn) = (0i64, 0i64, 0i64);
        for (v, t, n, faces) in &parts {
            for &p in faces {
                expected.push([
                    (p as i64 + pv, Some(*t as i64 + pt), Some(*n as i64 + pn)),
                    (p as i64 + pv, None, Some(1 + pn)),
                ]);
            }
            pv += *v as i64;
            pt += *t as i64;
            pn += *n as i64;
        }

        let actual: Vec<_> = doc
            .faces()
            .map(|face| {
                [
                    (face[0].position, face[0].texcoord, face[0].normal),
                    (face[1].position, face[1].texcoord, face[1].normal),
                ]
            })
            .collect();
        prop_assert_eq!(actual, expected);

        let counts = doc.counts();
        prop_assert_eq!(counts.positions, pv as u64);
        prop_assert_eq!(counts.texcoords, pt as u64);
        prop_assert_eq!(counts.normals, pn as u64);
        prop_assert!(doc.dangling_references().is_empty());
    });
}

#[test]
fn proptest_merge_is_deterministic() {
    proptest!(|(parts in prop::collection::vec(arb_part(), 2..4))| {
        let sources: Vec<GeometrySource> = parts
            .iter()
            .map(|(v, t, n, faces)| GeometrySource::new("p.obj", render_part(*v, *t, *n, faces)))
            .collect();

        let first = GeometryMerger::new().merge(&sources).unwrap();
        let second = GeometryMerger::new().merge(&sources).unwrap();
        prop_assert_eq!(first.content, second.content);
    });
}

#[test]
fn proptest_texture_flags_stripped() {
    let flag = prop::sample::select(vec![
        "-blendu on", "-blendv off", "-clamp on", "-bm 0.5", "-o 1 1 1", "-mm 0 1",
    ]);
    proptest!(|(flags in prop::collection::vec(flag, 0..5), name in "[a-z]{1,8}\\.(png|jpg)")| {
        let args = format!("{} {}", flags.join(" "), name);
        prop_assert_eq!(extract_texture_path(&args), name);
    });
}
