//! Graph file I/O: whitespace edge lists and serialized partitioned CSR.
//!
//! Edge lists are text, one `u v` (or `u v w`) per line, `#` starting a
//! comment; lines are dealt round-robin across ranks so every rank holds an
//! even share of the stream. Serialized graphs (`.sg` unweighted, `.wsg`
//! weighted) are host-endian binary: a three-word header
//! `(directed, num_nodes, num_edges_directed)`, the global index offsets,
//! the concatenated neighbor entries, and for directed graphs the inverse
//! index and neighbors. Rebuilding from a serialized file reproduces the
//! squished CSR byte for byte.

use crate::error::SymGraphError;
use crate::graph::{CsrSide, Destination, Edge, EdgeList, Graph, NodeId, SGOffset};
use crate::partition::Partition;
use crate::runtime::Rank;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// How a path on the command line should be ingested.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Text edge list.
    EdgeList,
    /// Serialized unweighted graph.
    Serialized,
    /// Serialized weighted graph.
    SerializedWeighted,
}

/// Classify `path` by suffix.
pub fn file_kind(path: &Path) -> FileKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some("sg") => FileKind::Serialized,
        Some("wsg") => FileKind::SerializedWeighted,
        _ => FileKind::EdgeList,
    }
}

/// Read this rank's round-robin share of a text edge list.
///
/// Returns the local edges and whether the file carried a weight column
/// (consistent across all data lines, or the read fails).
pub fn read_edge_list<D: Destination>(
    rank: &Rank,
    path: &Path,
) -> Result<(EdgeList<D>, bool), SymGraphError> {
    let file = File::open(path)?;
    let display = path.display().to_string();
    let mut el = EdgeList::new();
    let mut data_line = 0usize;
    let mut has_weights: Option<bool> = None;
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let mine = data_line % rank.npes() == rank.pe();
        data_line += 1;
        let mut fields = text.split_whitespace();
        let parse = |s: Option<&str>| -> Result<Option<NodeId>, SymGraphError> {
            match s {
                None => Ok(None),
                Some(tok) => tok
                    .parse::<NodeId>()
                    .map(Some)
                    .map_err(|e| SymGraphError::ParseEdge {
                        path: display.clone(),
                        line: lineno + 1,
                        msg: format!("`{tok}`: {e}"),
                    }),
            }
        };
        let u = parse(fields.next())?;
        let v = parse(fields.next())?;
        let w = parse(fields.next())?;
        let (u, v) = match (u, v) {
            (Some(u), Some(v)) => (u, v),
            _ => {
                return Err(SymGraphError::ParseEdge {
                    path: display,
                    line: lineno + 1,
                    msg: "expected at least two fields".into(),
                })
            }
        };
        let weighted = w.is_some();
        match has_weights {
            None => has_weights = Some(weighted),
            Some(prev) if prev != weighted => {
                return Err(SymGraphError::ParseEdge {
                    path: display,
                    line: lineno + 1,
                    msg: "inconsistent weight column".into(),
                })
            }
            Some(_) => {}
        }
        if mine {
            el.push(Edge {
                u,
                v: D::from_node_weight(v, w.unwrap_or(0)),
            });
        }
    }
    Ok((el, has_weights.unwrap_or(false)))
}

fn read_exact_i64(r: &mut impl Read, n: usize, path: &Path) -> Result<Vec<i64>, SymGraphError> {
    let mut bytes = vec![0u8; n * 8];
    r.read_exact(&mut bytes)
        .map_err(|_| SymGraphError::CorruptGraph(path.display().to_string()))?;
    Ok(bytemuck::cast_slice(&bytes).to_vec())
}

fn read_side<D: Destination>(
    rank: &Rank,
    vp: &Partition,
    r: &mut impl Read,
    num_edges_directed: i64,
    path: &Path,
) -> Result<CsrSide<D>, SymGraphError> {
    let gindex = read_exact_i64(r, vp.n + 1, path)?;
    if gindex[vp.n] != num_edges_directed {
        return Err(SymGraphError::CorruptGraph(path.display().to_string()));
    }
    let words_per = std::mem::size_of::<D>() / 8;
    let entries = read_exact_i64(r, num_edges_directed as usize * words_per, path)?;
    let entries: &[D] = bytemuck::cast_slice(&entries);

    let (start, end) = (vp.start as usize, vp.end as usize);
    let base = gindex[start];
    let local_total = gindex[end] - base;
    let max_total = (0..vp.npes)
        .map(|p| {
            let q = Partition::with_shape(vp.n, p, vp.npes);
            gindex[q.end as usize] - gindex[q.start as usize]
        })
        .max()
        .unwrap_or(0);

    let index = rank.alloc::<SGOffset>(vp.max_width + 1)?;
    let neighs = rank.alloc::<D>(max_total as usize)?;
    for (i, g) in gindex[start..=end].iter().enumerate() {
        index.write(i, g - base);
    }
    neighs.put_slice_to(
        rank.pe(),
        0,
        &entries[base as usize..(base + local_total) as usize],
    );
    rank.barrier();
    Ok(CsrSide { index, neighs })
}

/// Load a serialized graph into the partitioned CSR. Collective.
pub fn read_serialized<D: Destination>(
    rank: &Rank,
    path: &Path,
) -> Result<Graph<D>, SymGraphError> {
    let weighted = match file_kind(path) {
        FileKind::Serialized => false,
        FileKind::SerializedWeighted => true,
        FileKind::EdgeList => {
            return Err(SymGraphError::UnknownFormat(path.display().to_string()))
        }
    };
    if weighted != D::HAS_WEIGHT {
        return Err(SymGraphError::UnknownFormat(path.display().to_string()));
    }
    let mut file = BufReader::new(File::open(path)?);
    let header = read_exact_i64(&mut file, 3, path)?;
    let (directed, num_nodes, num_edges_directed) = (header[0] != 0, header[1], header[2]);
    if num_nodes < 0 || num_edges_directed < 0 {
        return Err(SymGraphError::CorruptGraph(path.display().to_string()));
    }
    let vp = Partition::new(num_nodes as usize, rank);
    let out = read_side::<D>(rank, &vp, &mut file, num_edges_directed, path)?;
    let inv = if directed {
        Some(read_side::<D>(rank, &vp, &mut file, num_edges_directed, path)?)
    } else {
        None
    };
    Ok(Graph::assemble(rank, vp, directed, out, inv))
}

fn gather_side<D: Destination>(
    g: &Graph<D>,
    side: &CsrSide<D>,
    out: &mut Vec<u8>,
) {
    let vp = g.partition();
    let mut gindex: Vec<i64> = Vec::with_capacity(vp.n + 1);
    let mut entries: Vec<D> = Vec::new();
    let mut base = 0i64;
    for p in 0..vp.npes {
        let q = Partition::with_shape(vp.n, p, vp.npes);
        let lw = q.local_width();
        let local_index = side.index.get_slice_from(p, 0, lw + 1);
        let total = local_index[lw];
        for off in &local_index[..lw] {
            gindex.push(base + off);
        }
        entries.extend(side.neighs.get_slice_from(p, 0, total as usize));
        base += total;
    }
    gindex.push(base);
    out.extend_from_slice(bytemuck::cast_slice(&gindex));
    out.extend_from_slice(bytemuck::cast_slice(&entries));
}

/// Serialize a built graph; rank 0 gathers remote slices and writes the
/// file. Collective.
pub fn write_serialized<D: Destination>(
    g: &Graph<D>,
    path: &Path,
) -> Result<(), SymGraphError> {
    let rank = g.rank();
    rank.barrier();
    if rank.pe() == 0 {
        let mut bytes = Vec::new();
        let header: [i64; 3] = [g.directed() as i64, g.num_nodes(), g.num_edges_directed()];
        bytes.extend_from_slice(bytemuck::cast_slice(&header));
        gather_side(g, g.out_side(), &mut bytes);
        if let Some(inv) = g.inv_side() {
            gather_side(g, inv, &mut bytes);
        }
        let mut file = File::create(path)?;
        file.write_all(&bytes)?;
    }
    rank.barrier();
    Ok(())
}
