//! Feature pre-simplification through the background worker.

use crate::feature::model::{Feature, Geometry, LonLat};
use crate::foundation::core::Point;
use crate::foundation::error::{FxError, FxResult};
use crate::layer::config::SimplifyConfig;
use crate::worker::{SimplifyWorker, WorkerRequest, WorkerResponse};

fn to_points(run: &[LonLat]) -> Vec<Point> {
    run.iter().map(|c| Point::new(c.lon, c.lat)).collect()
}

fn to_lon_lat(run: Vec<Point>) -> Vec<LonLat> {
    run.into_iter().map(|p| LonLat::new(p.x, p.y)).collect()
}

/// Coordinate runs worth simplifying, in a fixed traversal order.
fn collect_runs(g: &Geometry, out: &mut Vec<Vec<Point>>) {
    match g {
        Geometry::Point(_) | Geometry::MultiPoint(_) => {}
        Geometry::LineString(l) => out.push(to_points(l)),
        Geometry::MultiLineString(ls) => out.extend(ls.iter().map(|l| to_points(l))),
        Geometry::Polygon(rings) => out.extend(rings.iter().map(|r| to_points(r))),
        Geometry::MultiPolygon(polys) => {
            out.extend(polys.iter().flatten().map(|r| to_points(r)));
        }
    }
}

/// Rebuild `g` with runs taken from `runs` in the same order `collect_runs` produced them.
fn replace_runs(g: &Geometry, runs: &mut impl Iterator<Item = Vec<Point>>) -> Option<Geometry> {
    let mut next = || runs.next().map(to_lon_lat);
    Some(match g {
        Geometry::Point(_) | Geometry::MultiPoint(_) => g.clone(),
        Geometry::LineString(_) => Geometry::LineString(next()?),
        Geometry::MultiLineString(ls) => {
            Geometry::MultiLineString(ls.iter().map(|_| next()).collect::<Option<_>>()?)
        }
        Geometry::Polygon(rings) => {
            Geometry::Polygon(rings.iter().map(|_| next()).collect::<Option<_>>()?)
        }
        Geometry::MultiPolygon(polys) => Geometry::MultiPolygon(
            polys
                .iter()
                .map(|rings| rings.iter().map(|_| next()).collect::<Option<_>>())
                .collect::<Option<_>>()?,
        ),
    })
}

/// Simplify every line and ring off-thread. Fails with the worker's error, including
/// `WorkerTimeout`, in which case the caller builds from the raw features.
pub(crate) fn presimplify(
    worker: &mut SimplifyWorker,
    features: &[Feature],
    cfg: &SimplifyConfig,
) -> FxResult<Vec<Feature>> {
    let mut lines = Vec::new();
    for f in features {
        if let Some(g) = &f.geometry {
            collect_runs(g, &mut lines);
        }
    }
    let expected = lines.len();
    let id = worker.submit(WorkerRequest::SimplifyBatch {
        lines,
        tolerance: cfg.tolerance,
    })?;
    let WorkerResponse::Simplified(simplified) = worker.wait(id, cfg.timeout())? else {
        return Err(FxError::worker("unexpected response to a simplify request"));
    };
    if simplified.len() != expected {
        return Err(FxError::worker(format!(
            "simplify returned {} runs, expected {expected}",
            simplified.len()
        )));
    }

    let mut runs = simplified.into_iter();
    features
        .iter()
        .map(|f| {
            let mut out = f.clone();
            if let Some(g) = &f.geometry {
                out.geometry = Some(
                    replace_runs(g, &mut runs)
                        .ok_or_else(|| FxError::worker("simplified run count mismatch"))?,
                );
            }
            Ok(out)
        })
        .collect()
}
