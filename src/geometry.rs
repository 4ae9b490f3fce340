use serde::{Deserialize, Serialize};
use std::ops::Add;

pub trait PointLike {
    fn x(&self) -> i32;
    fn y(&self) -> i32;

    fn as_point(&self) -> Point {
        Point {
            x: self.x(),
            y: self.y(),
        }
    }
}

pub trait BoundingBox {
    fn top_left(&self) -> Point;
    fn bottom_right(&self) -> Point;
}

#[derive(Clone, Debug, Hash, Eq, PartialEq, Copy, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn manhattan_distance(&self, other: &Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let x_diff = (self.x - other.x) as f64;
        let y_diff = (self.y - other.y) as f64;
        (x_diff.powi(2) + y_diff.powi(2)).sqrt()
    }

    /// Coordinate along the given axis (x for horizontal, y for vertical).
    pub fn along(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    pub fn max_point(points: &[Point]) -> Point {
        let max_x = points.iter().map(|p| p.x).max().unwrap_or(0);
        let max_y = points.iter().map(|p| p.y).max().unwrap_or(0);
        Point { x: max_x, y: max_y }
    }

    pub fn min_point(points: &[Point]) -> Point {
        let min_x = points.iter().map(|p| p.x).min().unwrap_or(0);
        let min_y = points.iter().map(|p| p.y).min().unwrap_or(0);
        Point { x: min_x, y: min_y }
    }
}

impl rstar::Point for Point {
    type Scalar = i32;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Point {
            x: generator(0),
            y: generator(1),
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        match index {
            0 => self.x,
            1 => self.y,
            _ => panic!("Index out of bounds"),
        }
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        match index {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => panic!("Index out of bounds"),
        }
    }
}

impl PointLike for Point {
    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }
}

/// Axis-aligned rectangle. Constructed through [`Rectangle::from_corners`] so the
/// corners are always normalised.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    top_left: Point,
    bottom_right: Point,
}

impl Rectangle {
    pub fn from_corners(a: Point, b: Point) -> Self {
        Rectangle {
            top_left: Point::new(a.x.min(b.x), a.y.min(b.y)),
            bottom_right: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn width(&self) -> i32 {
        self.bottom_right.x - self.top_left.x
    }

    pub fn height(&self) -> i32 {
        self.bottom_right.y - self.top_left.y
    }

    /// True if an axis-aligned segment passes through the open interior.
    /// Running along an edge or touching a corner does not count.
    pub fn intersects_segment_interior(&self, from: Point, to: Point) -> bool {
        let (min_x, max_x) = (from.x.min(to.x), from.x.max(to.x));
        let (min_y, max_y) = (from.y.min(to.y), from.y.max(to.y));
        if min_y == max_y {
            self.top_left.y < min_y
                && min_y < self.bottom_right.y
                && min_x < self.bottom_right.x
                && max_x > self.top_left.x
        } else if min_x == max_x {
            self.top_left.x < min_x
                && min_x < self.bottom_right.x
                && min_y < self.bottom_right.y
                && max_y > self.top_left.y
        } else {
            false
        }
    }
}

impl BoundingBox for Rectangle {
    fn top_left(&self) -> Point {
        self.top_left
    }

    fn bottom_right(&self) -> Point {
        self.bottom_right
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn other(&self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// Exit side of a pin. Screen coordinates: `Down` grows y.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn to_orientation(&self) -> Orientation {
        match self {
            Direction::Up | Direction::Down => Orientation::Vertical,
            Direction::Left | Direction::Right => Orientation::Horizontal,
        }
    }

    pub fn unit(&self) -> Point {
        match self {
            Direction::Up => Point::new(0, -1),
            Direction::Down => Point::new(0, 1),
            Direction::Left => Point::new(-1, 0),
            Direction::Right => Point::new(1, 0),
        }
    }

    /// Move `point` by `distance` units in this direction.
    pub fn offset(&self, point: Point, distance: i32) -> Point {
        let unit = self.unit();
        Point::new(point.x + unit.x * distance, point.y + unit.y * distance)
    }

    /// Quarter turn clockwise on screen.
    pub fn rotate_clockwise(&self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    pub fn mirror_horizontal(&self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            other => *other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct DirectedPoint {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
}

impl PointLike for DirectedPoint {
    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }
}

impl DirectedPoint {
    pub fn new(x: i32, y: i32, direction: Direction) -> Self {
        DirectedPoint { x, y, direction }
    }

    /// The point `distance` units out along the exit direction.
    pub fn stub(&self, distance: i32) -> Point {
        self.direction.offset(self.as_point(), distance)
    }
}
